use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "id, email, full_name, hashed_password, role, class_name, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) full_name: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) class_name: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

/// Inserts a user. Returns `None` when the email is already taken.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateUser<'_>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, full_name, hashed_password, role, class_name, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        ON CONFLICT (email) DO NOTHING
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.full_name)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.class_name)
    .bind(params.now)
    .fetch_optional(pool)
    .await
}

pub(crate) struct UpdateProfile<'a> {
    pub(crate) full_name: Option<&'a str>,
    /// Outer `None` leaves the class untouched, `Some(None)` clears it.
    pub(crate) class_name: Option<Option<&'a str>>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: &str,
    params: UpdateProfile<'_>,
) -> Result<Option<User>, sqlx::Error> {
    let (set_class, class_name) = match params.class_name {
        Some(value) => (true, value),
        None => (false, None),
    };

    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            class_name = CASE WHEN $2 THEN $3 ELSE class_name END,
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.full_name)
    .bind(set_class)
    .bind(class_name)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
