use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::db::models::{AnswerOption, ExamSession, Question, Subject, User};
use crate::repositories;
use crate::services::subject_access;

pub(crate) async fn fetch_subject(pool: &PgPool, subject_id: &str) -> Result<Subject, ApiError> {
    repositories::subjects::find_by_id(pool, subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))
}

pub(crate) async fn fetch_question(pool: &PgPool, question_id: &str) -> Result<Question, ApiError> {
    repositories::questions::find_by_id(pool, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))
}

pub(crate) async fn fetch_option(pool: &PgPool, option_id: &str) -> Result<AnswerOption, ApiError> {
    repositories::options::find_by_id(pool, option_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch option"))?
        .ok_or_else(|| ApiError::NotFound("Option not found".to_string()))
}

pub(crate) async fn fetch_session(pool: &PgPool, session_id: &str) -> Result<ExamSession, ApiError> {
    repositories::sessions::find_by_id(pool, session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

/// Loads a subject and checks that `teacher` owns it.
pub(crate) async fn fetch_owned_subject(
    pool: &PgPool,
    teacher: &User,
    subject_id: &str,
) -> Result<Subject, ApiError> {
    let subject = fetch_subject(pool, subject_id).await?;
    if subject_access::owned_by(&subject, teacher) {
        Ok(subject)
    } else {
        Err(ApiError::Forbidden("Not authorized"))
    }
}

/// Loads a question together with its subject, checking ownership.
pub(crate) async fn fetch_owned_question(
    pool: &PgPool,
    teacher: &User,
    question_id: &str,
) -> Result<(Subject, Question), ApiError> {
    let question = fetch_question(pool, question_id).await?;
    let subject = fetch_owned_subject(pool, teacher, &question.subject_id).await?;
    Ok((subject, question))
}

/// Loads a session that must belong to `student`.
pub(crate) async fn fetch_own_session(
    pool: &PgPool,
    student: &User,
    session_id: &str,
) -> Result<ExamSession, ApiError> {
    let session = fetch_session(pool, session_id).await?;
    if session.student_id == student.id {
        Ok(session)
    } else {
        Err(ApiError::Forbidden("Not authorized"))
    }
}
