use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::subject::SubjectResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/recent", get(recent_subjects))
}

/// Newest subjects for the landing page. No authentication.
async fn recent_subjects(State(state): State<AppState>) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let limit = i64::try_from(state.settings().exam().recent_subjects_limit).unwrap_or(i64::MAX);

    let subjects = repositories::subjects::list_recent(state.db(), limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list recent subjects"))?;

    Ok(Json(subjects.into_iter().map(SubjectResponse::from_db).collect()))
}
