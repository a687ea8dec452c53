use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::AnswerOption;

pub(crate) const COLUMNS: &str = "id, question_id, text, is_correct, created_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AnswerOption>, sqlx::Error> {
    sqlx::query_as::<_, AnswerOption>(&format!("SELECT {COLUMNS} FROM options WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_question(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<Vec<AnswerOption>, sqlx::Error> {
    sqlx::query_as::<_, AnswerOption>(&format!(
        "SELECT {COLUMNS} FROM options WHERE question_id = $1 ORDER BY created_at, id"
    ))
    .bind(question_id)
    .fetch_all(executor)
    .await
}

/// Every option under the subject's questions, grouped by question.
pub(crate) async fn list_by_subject(
    executor: impl sqlx::PgExecutor<'_>,
    subject_id: &str,
) -> Result<Vec<AnswerOption>, sqlx::Error> {
    sqlx::query_as::<_, AnswerOption>(
        "SELECT o.id, o.question_id, o.text, o.is_correct, o.created_at \
         FROM options o \
         JOIN questions q ON q.id = o.question_id \
         WHERE q.subject_id = $1 \
         ORDER BY q.order_index, q.created_at, q.id, o.created_at, o.id",
    )
    .bind(subject_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateOption<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateOption<'_>,
) -> Result<AnswerOption, sqlx::Error> {
    sqlx::query_as::<_, AnswerOption>(&format!(
        "INSERT INTO options (id, question_id, text, is_correct, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.text)
    .bind(params.is_correct)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    text: Option<&str>,
    is_correct: Option<bool>,
) -> Result<AnswerOption, sqlx::Error> {
    sqlx::query_as::<_, AnswerOption>(&format!(
        "UPDATE options SET
            text = COALESCE($1, text),
            is_correct = COALESCE($2, is_correct)
         WHERE id = $3
         RETURNING {COLUMNS}",
    ))
    .bind(text)
    .bind(is_correct)
    .bind(id)
    .fetch_one(executor)
    .await
}

/// Clears the correct flag on every option of the question except `keep_id`.
pub(crate) async fn clear_correct(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
    keep_id: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE options SET is_correct = FALSE \
         WHERE question_id = $1 AND is_correct AND ($2::text IS NULL OR id <> $2)",
    )
    .bind(question_id)
    .bind(keep_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM options WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
