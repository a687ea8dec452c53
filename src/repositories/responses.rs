use time::PrimitiveDateTime;

use crate::db::models::StudentResponse;

pub(crate) const COLUMNS: &str = "\
    id, session_id, question_id, selected_option_id, created_at, updated_at";

pub(crate) async fn list_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<StudentResponse>, sqlx::Error> {
    sqlx::query_as::<_, StudentResponse>(&format!(
        "SELECT {COLUMNS} FROM responses WHERE session_id = $1 ORDER BY created_at, id"
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn exists_for_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM responses WHERE session_id = $1)")
        .bind(session_id)
        .fetch_one(executor)
        .await
}

pub(crate) struct UpsertResponse<'a> {
    pub(crate) id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

/// One row per (session, question); a later answer replaces the earlier one.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertResponse<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO responses (
            id, session_id, question_id, selected_option_id, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$5)
        ON CONFLICT (session_id, question_id) DO UPDATE SET
            selected_option_id = EXCLUDED.selected_option_id,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(params.id)
    .bind(params.session_id)
    .bind(params.question_id)
    .bind(params.selected_option_id)
    .bind(params.now)
    .execute(executor)
    .await?;
    Ok(())
}
