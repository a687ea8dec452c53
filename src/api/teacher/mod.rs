mod questions;
mod subjects;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(subjects::list_subjects).post(subjects::create_subject))
        .route(
            "/subjects/:subject_id",
            get(subjects::get_subject)
                .patch(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
        .route("/subjects/:subject_id/questions", post(questions::create_question))
        .route(
            "/questions/:question_id",
            patch(questions::update_question).delete(questions::delete_question),
        )
        .route("/questions/:question_id/options", post(questions::create_option))
        .route(
            "/options/:option_id",
            patch(questions::update_option).delete(questions::delete_option),
        )
}
