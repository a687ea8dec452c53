use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{normalize_class_name, normalize_email};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserLogin, UserRegister, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = normalize_email(&payload.email);
    let class_name = normalize_class_name(payload.class_name.as_deref())?;
    let full_name = payload.full_name.trim();

    if repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?
    {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            full_name,
            hashed_password,
            role: payload.role,
            class_name,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?
    .ok_or_else(|| ApiError::Conflict("Email already registered".to_string()))?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), action = "register", "User registered");

    Ok((StatusCode::CREATED, Json(issue_token(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !verified {
        tracing::info!(user_id = %user.id, action = "login", "Rejected login");
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    Ok(Json(issue_token(&state, user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

fn issue_token(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, user.role, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
    Ok(TokenResponse::bearer(token, UserResponse::from_db(user)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn register_login_and_me() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "full_name": "Chidi Okeke",
                    "email": "Chidi@School.ng",
                    "password": "pass123",
                    "role": "student",
                    "class_name": "JSS 2"
                })),
            ))
            .await
            .expect("register");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
        assert_eq!(body["user"]["email"], "chidi@school.ng");
        assert_eq!(body["user"]["class_name"], "JSS 2");
        assert_eq!(body["token_type"], "bearer");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "chidi@school.ng", "password": "pass123"})),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        let token = body["access_token"].as_str().expect("token").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["full_name"], "Chidi Okeke");
        assert_eq!(body["role"], "student");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_student(ctx.state.db(), "taken@school.ng", None).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "full_name": "Another Person",
                    "email": "TAKEN@school.ng",
                    "password": "pass123"
                })),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_validates_fields_and_class() {
        let ctx = test_support::setup_test_context().await;

        for payload in [
            json!({"full_name": "Al", "email": "al@school.ng", "password": "pass123"}),
            json!({"full_name": "Alice Ade", "email": "alice", "password": "pass123"}),
            json!({"full_name": "Alice Ade", "email": "alice@school.ng", "password": "12345"}),
            json!({
                "full_name": "Alice Ade",
                "email": "alice@school.ng",
                "password": "pass123",
                "class_name": "Grade 9"
            }),
        ] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/auth/register",
                    None,
                    Some(payload.clone()),
                ))
                .await
                .expect("register");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {payload}");
        }
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_student(ctx.state.db(), "ngozi@school.ng", None).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "ngozi@school.ng", "password": "nope-nope"})),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", None, None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_with_stale_role_is_rejected() {
        let ctx = test_support::setup_test_context().await;
        let student = test_support::insert_student(ctx.state.db(), "role@school.ng", None).await;
        let forged = crate::core::security::create_access_token(
            &student.id,
            crate::db::types::UserRole::Teacher,
            ctx.state.settings(),
            None,
        )
        .expect("token");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&forged), None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
