use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::helpers;
use crate::api::validation::validate_answers;
use crate::core::metrics::{self, SessionEvent};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{AnswerOption, ExamSession, Question, Subject, User};
use crate::repositories;
use crate::schemas::report::SessionReportResponse;
use crate::schemas::session::{
    answers_map, AnswersPayload, ExamQuestion, ExamViewResponse, SaveResponsesResponse,
    SessionResponse,
};
use crate::schemas::subject::SubjectSummary;
use crate::services::exam_timing::{self, SubmissionPolicy, ViewDecision};
use crate::services::reports;

pub(super) async fn view_session(
    Path(session_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ExamViewResponse>, ApiError> {
    let session = helpers::fetch_own_session(state.db(), &student, &session_id).await?;
    let subject = helpers::fetch_subject(state.db(), &session.subject_id).await?;
    let has_responses = repositories::responses::exists_for_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check responses"))?;

    let now = primitive_now_utc();
    let decision = exam_timing::decide_view(
        session.status,
        session.started_at,
        subject.duration_minutes,
        has_responses,
        now,
    );

    let (session, remaining_seconds) = match decision {
        ViewDecision::Render { remaining_seconds } => (session, remaining_seconds),
        ViewDecision::Restart => {
            match repositories::sessions::restart(state.db(), &session.id, now)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to restart session"))?
            {
                Some(restarted) => {
                    metrics::record_session_event(SessionEvent::Restarted);
                    tracing::info!(
                        user_id = %student.id,
                        subject_id = %subject.id,
                        session_id = %restarted.id,
                        action = "restart_session",
                        "Unanswered expired session restarted"
                    );
                    (restarted, exam_timing::full_duration_seconds(subject.duration_minutes))
                }
                // Closed concurrently by another request.
                None => (helpers::fetch_session(state.db(), &session.id).await?, 0),
            }
        }
        ViewDecision::Lapse { mark_expired } => {
            if mark_expired {
                let expired = repositories::sessions::mark_expired(state.db(), &session.id, now)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to expire session"))?;
                if expired {
                    metrics::record_session_event(SessionEvent::Expired);
                }
                (helpers::fetch_session(state.db(), &session.id).await?, 0)
            } else {
                (session, 0)
            }
        }
        ViewDecision::Closed => (session, 0),
    };

    let phase = exam_timing::classify(
        session.status,
        session.started_at,
        subject.duration_minutes,
        has_responses,
        now,
    );

    let questions = repositories::questions::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let options = repositories::options::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;
    let responses = repositories::responses::list_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch responses"))?;

    Ok(Json(ExamViewResponse {
        session: SessionResponse::from_db(&session, subject.duration_minutes),
        subject: SubjectSummary::from_db(&subject),
        phase: phase.as_str(),
        remaining_seconds,
        questions: ExamQuestion::build_all(questions, &options),
        answers: answers_map(&responses),
    }))
}

/// Session and subject for a save or submit that passed the timing gate and
/// answer validation.
struct WriteContext {
    session: ExamSession,
    subject: Subject,
}

async fn prepare_write(
    state: &AppState,
    student: &User,
    session_id: &str,
    payload: &AnswersPayload,
) -> Result<WriteContext, ApiError> {
    let session = helpers::fetch_own_session(state.db(), student, session_id).await?;
    let subject = helpers::fetch_subject(state.db(), &session.subject_id).await?;

    exam_timing::check_write(
        session.status,
        session.started_at,
        subject.duration_minutes,
        primitive_now_utc(),
        SubmissionPolicy::from_settings(state.settings().exam()),
    )?;

    let (questions, options) = load_answer_key(state, &subject).await?;
    validate_answers(&payload.answers, &questions, &options)?;

    Ok(WriteContext { session, subject })
}

async fn load_answer_key(
    state: &AppState,
    subject: &Subject,
) -> Result<(Vec<Question>, Vec<AnswerOption>), ApiError> {
    let questions = repositories::questions::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let options = repositories::options::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;
    Ok((questions, options))
}

/// Re-reads the session under a row lock and repeats the timing gate, so a
/// submit that committed after `prepare_write` is seen before any write.
async fn lock_writable(
    conn: &mut sqlx::PgConnection,
    state: &AppState,
    session_id: &str,
    subject: &Subject,
) -> Result<ExamSession, ApiError> {
    let session = repositories::sessions::lock_for_update(&mut *conn, session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    exam_timing::check_write(
        session.status,
        session.started_at,
        subject.duration_minutes,
        primitive_now_utc(),
        SubmissionPolicy::from_settings(state.settings().exam()),
    )?;

    Ok(session)
}

async fn upsert_answers(
    conn: &mut sqlx::PgConnection,
    session_id: &str,
    payload: &AnswersPayload,
) -> Result<(), ApiError> {
    let now = primitive_now_utc();
    for (question_id, option_id) in &payload.answers {
        repositories::responses::upsert(
            &mut *conn,
            repositories::responses::UpsertResponse {
                id: &Uuid::new_v4().to_string(),
                session_id,
                question_id: question_id.as_str(),
                selected_option_id: option_id.as_str(),
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to save response"))?;
    }
    Ok(())
}

pub(super) async fn save_responses(
    Path(session_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AnswersPayload>,
) -> Result<Json<SaveResponsesResponse>, ApiError> {
    let WriteContext { session, subject } =
        prepare_write(&state, &student, &session_id, &payload).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let session = lock_writable(&mut *tx, &state, &session.id, &subject).await?;
    upsert_answers(&mut *tx, &session.id, &payload).await?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::debug!(
        user_id = %student.id,
        session_id = %session.id,
        saved = payload.answers.len(),
        action = "save_responses",
        "Responses saved"
    );

    Ok(Json(SaveResponsesResponse {
        session_id: session.id,
        saved: payload.answers.len(),
        remaining_seconds: exam_timing::remaining_seconds(
            session.started_at,
            subject.duration_minutes,
            primitive_now_utc(),
        ),
    }))
}

pub(super) async fn submit_session(
    Path(session_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AnswersPayload>,
) -> Result<Json<SessionReportResponse>, ApiError> {
    let WriteContext { session, subject } =
        prepare_write(&state, &student, &session_id, &payload).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let session = lock_writable(&mut *tx, &state, &session.id, &subject).await?;
    upsert_answers(&mut *tx, &session.id, &payload).await?;
    let completed = repositories::sessions::complete(&mut *tx, &session.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to complete session"))?
        .ok_or_else(|| ApiError::Conflict("Session already submitted".to_string()))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let material = reports::load_session_for_subject(state.db(), subject, completed)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}"), "Failed to load session report"))?;
    let report = SessionReportResponse::from_material(&material);

    metrics::record_session_event(SessionEvent::Submitted);
    metrics::record_score(report.percentage);
    tracing::info!(
        user_id = %student.id,
        subject_id = %material.subject.id,
        session_id = %material.session.id,
        correct = report.correct,
        total = report.total,
        action = "submit_session",
        "Exam submitted"
    );

    Ok(Json(report))
}
