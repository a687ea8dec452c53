use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{AnswerOption, ExamSession, Question, StudentResponse};
use crate::db::types::SessionStatus;
use crate::schemas::subject::SubjectSummary;
use crate::services::exam_timing;

/// Answers keyed by question id, each naming the chosen option id.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnswersPayload {
    #[serde(default)]
    pub(crate) answers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) student_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: String,
    pub(crate) deadline: String,
    pub(crate) completed_at: Option<String>,
}

impl SessionResponse {
    pub(crate) fn from_db(session: &ExamSession, duration_minutes: i32) -> Self {
        Self {
            id: session.id.clone(),
            subject_id: session.subject_id.clone(),
            student_id: session.student_id.clone(),
            status: session.status,
            started_at: format_primitive(session.started_at),
            deadline: format_primitive(exam_timing::deadline(session.started_at, duration_minutes)),
            completed_at: session.completed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartExamResponse {
    pub(crate) session_id: String,
    pub(crate) resumed: bool,
    pub(crate) remaining_seconds: i64,
    pub(crate) session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamOption {
    pub(crate) id: String,
    pub(crate) text: String,
}

/// Question as shown to a student: no correctness flags.
#[derive(Debug, Serialize)]
pub(crate) struct ExamQuestion {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) time_limit_seconds: Option<i32>,
    pub(crate) options: Vec<ExamOption>,
}

impl ExamQuestion {
    pub(crate) fn build_all(questions: Vec<Question>, options: &[AnswerOption]) -> Vec<Self> {
        questions
            .into_iter()
            .map(|question| {
                let options = options
                    .iter()
                    .filter(|option| option.question_id == question.id)
                    .map(|option| ExamOption { id: option.id.clone(), text: option.text.clone() })
                    .collect();
                Self {
                    id: question.id,
                    text: question.text,
                    time_limit_seconds: question.time_limit_seconds,
                    options,
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamViewResponse {
    pub(crate) session: SessionResponse,
    pub(crate) subject: SubjectSummary,
    pub(crate) phase: &'static str,
    pub(crate) remaining_seconds: i64,
    pub(crate) questions: Vec<ExamQuestion>,
    pub(crate) answers: BTreeMap<String, String>,
}

pub(crate) fn answers_map(responses: &[StudentResponse]) -> BTreeMap<String, String> {
    responses
        .iter()
        .map(|response| (response.question_id.clone(), response.selected_option_id.clone()))
        .collect()
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveResponsesResponse {
    pub(crate) session_id: String,
    pub(crate) saved: usize,
    pub(crate) remaining_seconds: i64,
}
