mod exams;
mod sessions;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(exams::list_subjects))
        .route("/subjects/:subject_id/start", post(exams::start_exam))
        .route("/sessions/:session_id", get(sessions::view_session))
        .route("/sessions/:session_id/responses", put(sessions::save_responses))
        .route("/sessions/:session_id/submit", post(sessions::submit_session))
        .route("/report-card", get(exams::report_card))
}
