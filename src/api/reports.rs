use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::helpers;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::schemas::report::SessionReportResponse;
use crate::services::reports;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/sessions/:session_id", get(session_report))
}

/// Scored breakdown of one session, for its student or any teacher.
async fn session_report(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionReportResponse>, ApiError> {
    let session = helpers::fetch_session(state.db(), &session_id).await?;
    if user.role != UserRole::Teacher && session.student_id != user.id {
        return Err(ApiError::Forbidden("Not authorized"));
    }

    let material = reports::load_session(state.db(), session)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}"), "Failed to load session report"))?;

    Ok(Json(SessionReportResponse::from_material(&material)))
}

#[cfg(test)]
mod tests;
