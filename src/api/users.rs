use axum::{extract::State, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::normalize_class_name;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{UserResponse, UserUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(read_me).patch(update_me))
}

async fn read_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

/// Profile settings: full name and class. Sending `class_name: null` or an
/// empty string clears the class.
async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class_name = match payload.class_name.as_ref() {
        Some(value) => Some(normalize_class_name(value.as_deref())?),
        None => None,
    };

    let updated = repositories::users::update_profile(
        state.db(),
        &user.id,
        repositories::users::UpdateProfile {
            full_name: payload.full_name.as_deref().map(str::trim),
            class_name,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        user_id = %updated.id,
        class_name = updated.class_name.as_deref().unwrap_or("-"),
        action = "update_profile",
        "Profile updated"
    );

    Ok(Json(UserResponse::from_db(updated)))
}
