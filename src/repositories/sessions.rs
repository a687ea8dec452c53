use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ExamSession;
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, subject_id, student_id, started_at, completed_at, status, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Locks the session row so answer writes and submission serialize.
pub(crate) async fn lock_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Serializes start requests for one (subject, student) pair until the
/// surrounding transaction ends.
pub(crate) async fn acquire_subject_student_lock(
    executor: impl sqlx::PgExecutor<'_>,
    subject_id: &str,
    student_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
        .bind(subject_id)
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Latest session still marked active for the pair.
pub(crate) async fn find_open(
    executor: impl sqlx::PgExecutor<'_>,
    subject_id: &str,
    student_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE subject_id = $1 AND student_id = $2 AND status = $3 \
         ORDER BY started_at DESC, id DESC LIMIT 1"
    ))
    .bind(subject_id)
    .bind(student_id)
    .bind(SessionStatus::Active)
    .fetch_optional(executor)
    .await
}

/// Most recently completed session for the pair; ties on completion time go
/// to the later start.
pub(crate) async fn find_latest_completed(
    pool: &PgPool,
    subject_id: &str,
    student_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE subject_id = $1 AND student_id = $2 AND completed_at IS NOT NULL \
         ORDER BY completed_at DESC, started_at DESC, id DESC LIMIT 1"
    ))
    .bind(subject_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) started_at: PrimitiveDateTime,
}

/// Inserts an active session. Returns `false` when another active session
/// for the pair already exists.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_sessions (
            id, subject_id, student_id, started_at, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$4,$4)
        ON CONFLICT DO NOTHING",
    )
    .bind(session.id)
    .bind(session.subject_id)
    .bind(session.student_id)
    .bind(session.started_at)
    .bind(SessionStatus::Active)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn mark_expired(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exam_sessions SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
    )
    .bind(SessionStatus::Expired)
    .bind(now)
    .bind(id)
    .bind(SessionStatus::Active)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Moves the start of a still-active session to `started_at`.
pub(crate) async fn restart(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    started_at: PrimitiveDateTime,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "UPDATE exam_sessions SET started_at = $1, updated_at = $1 \
         WHERE id = $2 AND status = $3 \
         RETURNING {COLUMNS}"
    ))
    .bind(started_at)
    .bind(id)
    .bind(SessionStatus::Active)
    .fetch_optional(executor)
    .await
}

/// Marks the session completed. Returns `None` if it was already completed.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "UPDATE exam_sessions SET completed_at = $1, status = $2, updated_at = $1 \
         WHERE id = $3 AND status <> $2 \
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(SessionStatus::Completed)
    .bind(id)
    .fetch_optional(executor)
    .await
}
