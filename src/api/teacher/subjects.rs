use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::helpers;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::api::validation::normalize_class_name;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::subject::{SubjectCreate, SubjectDetailResponse, SubjectResponse, SubjectUpdate};

pub(super) async fn list_subjects(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<SubjectResponse>>, ApiError> {
    let (skip, limit) = page.normalized();

    let subjects = repositories::subjects::list_by_teacher(state.db(), &teacher.id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;
    let total_count = repositories::subjects::count_by_teacher(state.db(), &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count subjects"))?;

    Ok(Json(PaginatedResponse {
        items: subjects.into_iter().map(SubjectResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

pub(super) async fn create_subject(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let class_name = normalize_class_name(payload.class_name.as_deref())?;

    let subject = repositories::subjects::create(
        state.db(),
        repositories::subjects::CreateSubject {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            description: payload.description.as_deref().map(str::trim).filter(|d| !d.is_empty()),
            duration_minutes: payload.duration_minutes,
            class_name,
            teacher_id: &teacher.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    tracing::info!(
        subject_id = %subject.id,
        teacher_id = %teacher.id,
        duration_minutes = subject.duration_minutes,
        action = "create_subject",
        "Subject created"
    );

    Ok((StatusCode::CREATED, Json(SubjectResponse::from_db(subject))))
}

pub(super) async fn get_subject(
    Path(subject_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<SubjectDetailResponse>, ApiError> {
    let subject = helpers::fetch_owned_subject(state.db(), &teacher, &subject_id).await?;

    let questions = repositories::questions::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let options = repositories::options::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(Json(SubjectDetailResponse::assemble(subject, questions, options)))
}

pub(super) async fn update_subject(
    Path(subject_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<SubjectUpdate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    helpers::fetch_owned_subject(state.db(), &teacher, &subject_id).await?;

    let class_name = match payload.class_name.as_ref() {
        Some(value) => Some(normalize_class_name(value.as_deref())?),
        None => None,
    };
    let description = payload
        .description
        .as_ref()
        .map(|value| value.as_deref().map(str::trim).filter(|d| !d.is_empty()));

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let current = repositories::subjects::lock_for_update(&mut *tx, &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    if let Some(duration) = payload.duration_minutes {
        if duration != current.duration_minutes
            && repositories::subjects::has_active_sessions(
                &mut *tx,
                &subject_id,
                current.duration_minutes,
                primitive_now_utc(),
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check active sessions"))?
        {
            return Err(ApiError::Conflict(
                "Duration cannot change while an exam is in progress".to_string(),
            ));
        }
    }

    let subject = repositories::subjects::update(
        &mut *tx,
        &subject_id,
        repositories::subjects::UpdateSubject {
            name: payload.name.as_deref().map(str::trim),
            description,
            duration_minutes: payload.duration_minutes,
            class_name,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update subject"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(subject_id = %subject.id, teacher_id = %teacher.id, action = "update_subject", "Subject updated");

    Ok(Json(SubjectResponse::from_db(subject)))
}

pub(super) async fn delete_subject(
    Path(subject_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    helpers::fetch_owned_subject(state.db(), &teacher, &subject_id).await?;

    let deleted = repositories::subjects::delete(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete subject"))?;
    if !deleted {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    tracing::info!(subject_id = %subject_id, teacher_id = %teacher.id, action = "delete_subject", "Subject deleted");

    Ok(StatusCode::NO_CONTENT)
}
