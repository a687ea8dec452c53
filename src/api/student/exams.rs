use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::helpers;
use crate::core::metrics::{self, SessionEvent};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::report::ReportCardResponse;
use crate::schemas::session::{SessionResponse, StartExamResponse};
use crate::schemas::subject::SubjectResponse;
use crate::services::exam_timing::{self, StartDecision};
use crate::services::reports;
use crate::services::subject_access;

pub(super) async fn list_subjects(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let subjects =
        repositories::subjects::list_visible_for_class(state.db(), student.class_name.as_deref())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(subjects.into_iter().map(SubjectResponse::from_db).collect()))
}

pub(super) async fn start_exam(
    Path(subject_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartExamResponse>), ApiError> {
    let subject = helpers::fetch_subject(state.db(), &subject_id).await?;
    if !subject_access::visible_to_student(&subject, &student) {
        return Err(ApiError::Forbidden("Subject is not available for your class"));
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::sessions::acquire_subject_student_lock(&mut *tx, &subject.id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock exam start"))?;

    let open = repositories::sessions::find_open(&mut *tx, &subject.id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch open session"))?;

    let decision =
        exam_timing::decide_start(open.as_ref().map(|s| s.started_at), subject.duration_minutes, now);

    let (session, resumed) = match (decision, open) {
        (StartDecision::Resume, Some(session)) => (session, true),
        (decision, open) => {
            if let (StartDecision::Supersede, Some(stale)) = (decision, open.as_ref()) {
                repositories::sessions::mark_expired(&mut *tx, &stale.id, now)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to expire stale session"))?;
                metrics::record_session_event(SessionEvent::Expired);
                tracing::info!(
                    user_id = %student.id,
                    subject_id = %subject.id,
                    session_id = %stale.id,
                    action = "supersede_session",
                    "Stale session marked expired"
                );
            }

            let session_id = Uuid::new_v4().to_string();
            repositories::sessions::create(
                &mut *tx,
                repositories::sessions::CreateSession {
                    id: &session_id,
                    subject_id: &subject.id,
                    student_id: &student.id,
                    started_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create session"))?;

            let session = repositories::sessions::find_open(&mut *tx, &subject.id, &student.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
                .ok_or_else(|| ApiError::Internal("Session missing after start".to_string()))?;
            let resumed = session.id != session_id;
            (session, resumed)
        }
    };

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let (event, action) = if resumed {
        (SessionEvent::Resumed, "resume_exam")
    } else {
        (SessionEvent::Started, "start_exam")
    };
    metrics::record_session_event(event);
    tracing::info!(
        user_id = %student.id,
        subject_id = %subject.id,
        session_id = %session.id,
        action,
        "Exam session opened"
    );

    let status = if resumed { StatusCode::OK } else { StatusCode::CREATED };
    Ok((
        status,
        Json(StartExamResponse {
            session_id: session.id.clone(),
            resumed,
            remaining_seconds: exam_timing::remaining_seconds(
                session.started_at,
                subject.duration_minutes,
                now,
            ),
            session: SessionResponse::from_db(&session, subject.duration_minutes),
        }),
    ))
}

pub(super) async fn report_card(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ReportCardResponse>, ApiError> {
    let card = reports::build_report_card(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}"), "Failed to build report card"))?;

    Ok(Json(ReportCardResponse::from_card(student.id, card)))
}
