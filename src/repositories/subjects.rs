use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Subject;
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, name, description, duration_minutes, class_name, teacher_id, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_by_teacher(
    pool: &PgPool,
    teacher_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects WHERE teacher_id = $1 \
         ORDER BY created_at DESC, id OFFSET $2 LIMIT $3"
    ))
    .bind(teacher_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_teacher(pool: &PgPool, teacher_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE teacher_id = $1")
        .bind(teacher_id)
        .fetch_one(pool)
        .await
}

/// Subjects a student in `class_name` may take; `None` means every subject.
pub(crate) async fn list_visible_for_class(
    pool: &PgPool,
    class_name: Option<&str>,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects \
         WHERE $1::text IS NULL OR class_name IS NULL OR class_name = $1 \
         ORDER BY name, created_at"
    ))
    .bind(class_name)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects ORDER BY created_at DESC, id LIMIT $1"
    ))
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateSubject<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) duration_minutes: i32,
    pub(crate) class_name: Option<&'a str>,
    pub(crate) teacher_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateSubject<'_>) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (
            id, name, description, duration_minutes, class_name, teacher_id, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.class_name)
    .bind(params.teacher_id)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateSubject<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) description: Option<Option<&'a str>>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) class_name: Option<Option<&'a str>>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateSubject<'_>,
) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "UPDATE subjects SET
            name = COALESCE($1, name),
            description = CASE WHEN $2 THEN $3 ELSE description END,
            duration_minutes = COALESCE($4, duration_minutes),
            class_name = CASE WHEN $5 THEN $6 ELSE class_name END,
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.description.is_some())
    .bind(params.description.flatten())
    .bind(params.duration_minutes)
    .bind(params.class_name.is_some())
    .bind(params.class_name.flatten())
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Locks the subject row so duration edits and session starts serialize.
pub(crate) async fn lock_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// True while some session of the subject is still inside its time window.
/// Lapsed sessions that were never viewed again keep the active status and
/// are excluded by the deadline check.
pub(crate) async fn has_active_sessions(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM exam_sessions \
         WHERE subject_id = $1 AND status = $2 \
         AND started_at + make_interval(mins => $3) > $4)",
    )
    .bind(id)
    .bind(SessionStatus::Active)
    .bind(duration_minutes)
    .bind(now)
    .fetch_one(executor)
    .await
}
