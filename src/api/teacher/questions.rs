use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::helpers;
use crate::api::validation::validate_time_limit;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::subject::{
    OptionCreate, OptionResponse, OptionUpdate, QuestionCreate, QuestionResponse, QuestionUpdate,
};

pub(super) async fn create_question(
    Path(subject_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let subject = helpers::fetch_owned_subject(state.db(), &teacher, &subject_id).await?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            subject_id: &subject.id,
            text: payload.text.trim(),
            time_limit_seconds: payload.time_limit_seconds,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(
        subject_id = %subject.id,
        question_id = %question.id,
        action = "create_question",
        "Question created"
    );

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question, Vec::new()))))
}

pub(super) async fn update_question(
    Path(question_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(limit) = payload.time_limit_seconds {
        validate_time_limit(limit)?;
    }
    let (_, question) = helpers::fetch_owned_question(state.db(), &teacher, &question_id).await?;

    let question = repositories::questions::update(
        state.db(),
        &question.id,
        repositories::questions::UpdateQuestion {
            text: payload.text.as_deref().map(str::trim),
            time_limit_seconds: payload.time_limit_seconds,
            order_index: payload.order_index,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;

    let options = repositories::options::list_by_question(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(Json(QuestionResponse::from_db(
        question,
        options.into_iter().map(OptionResponse::from_db).collect(),
    )))
}

pub(super) async fn delete_question(
    Path(question_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (subject, question) =
        helpers::fetch_owned_question(state.db(), &teacher, &question_id).await?;

    let deleted = repositories::questions::delete(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    tracing::info!(
        subject_id = %subject.id,
        question_id = %question.id,
        action = "delete_question",
        "Question deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_option(
    Path(question_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<OptionCreate>,
) -> Result<(StatusCode, Json<OptionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let (_, question) = helpers::fetch_owned_question(state.db(), &teacher, &question_id).await?;

    let option_id = Uuid::new_v4().to_string();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::questions::lock_for_update(&mut *tx, &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if payload.is_correct {
        repositories::options::clear_correct(&mut *tx, &question.id, None)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to reset correct option"))?;
    }

    let option = repositories::options::create(
        &mut *tx,
        repositories::options::CreateOption {
            id: &option_id,
            question_id: &question.id,
            text: payload.text.trim(),
            is_correct: payload.is_correct,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create option"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(OptionResponse::from_db(option))))
}

pub(super) async fn update_option(
    Path(option_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<OptionUpdate>,
) -> Result<Json<OptionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let option = helpers::fetch_option(state.db(), &option_id).await?;
    helpers::fetch_owned_question(state.db(), &teacher, &option.question_id).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::questions::lock_for_update(&mut *tx, &option.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if payload.is_correct == Some(true) {
        repositories::options::clear_correct(&mut *tx, &option.question_id, Some(&option.id))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to reset correct option"))?;
    }

    let option = repositories::options::update(
        &mut *tx,
        &option.id,
        payload.text.as_deref().map(str::trim),
        payload.is_correct,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update option"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok(Json(OptionResponse::from_db(option)))
}

pub(super) async fn delete_option(
    Path(option_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let option = helpers::fetch_option(state.db(), &option_id).await?;
    helpers::fetch_owned_question(state.db(), &teacher, &option.question_id).await?;

    let deleted = repositories::options::delete(state.db(), &option.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete option"))?;
    if !deleted {
        return Err(ApiError::NotFound("Option not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
