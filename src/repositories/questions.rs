use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;

pub(crate) const COLUMNS: &str = "\
    id, subject_id, text, time_limit_seconds, order_index, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Questions in display order.
pub(crate) async fn list_by_subject(
    executor: impl sqlx::PgExecutor<'_>,
    subject_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE subject_id = $1 \
         ORDER BY order_index, created_at, id"
    ))
    .bind(subject_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) time_limit_seconds: Option<i32>,
    pub(crate) now: PrimitiveDateTime,
}

/// Appends a question after the current last one in its subject.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, subject_id, text, time_limit_seconds, order_index, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4,
            COALESCE((SELECT MAX(order_index) FROM questions WHERE subject_id = $2), 0) + 1,
            $5, $5
        )
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.subject_id)
    .bind(params.text)
    .bind(params.time_limit_seconds)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuestion<'a> {
    pub(crate) text: Option<&'a str>,
    pub(crate) time_limit_seconds: Option<Option<i32>>,
    pub(crate) order_index: Option<i32>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            text = COALESCE($1, text),
            time_limit_seconds = CASE WHEN $2 THEN $3 ELSE time_limit_seconds END,
            order_index = COALESCE($4, order_index),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.text)
    .bind(params.time_limit_seconds.is_some())
    .bind(params.time_limit_seconds.flatten())
    .bind(params.order_index)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Row lock taken before touching a question's correct-option flags.
pub(crate) async fn lock_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
