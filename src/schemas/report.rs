use serde::Serialize;

use crate::core::time::format_primitive;
use crate::schemas::session::SessionResponse;
use crate::schemas::subject::SubjectSummary;
use crate::services::grading::Grade;
use crate::services::reports::{ReportCard, SessionMaterial};

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResultResponse {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) selected_option_text: Option<String>,
    pub(crate) correct_option_id: Option<String>,
    pub(crate) correct_option_text: Option<String>,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionReportResponse {
    pub(crate) session: SessionResponse,
    pub(crate) subject: SubjectSummary,
    pub(crate) results: Vec<QuestionResultResponse>,
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) percentage: f64,
    pub(crate) grade: Grade,
}

impl SessionReportResponse {
    pub(crate) fn from_material(material: &SessionMaterial) -> Self {
        let scored = material.score();
        let results = scored
            .results
            .iter()
            .map(|result| QuestionResultResponse {
                question_id: result.question.id.clone(),
                question_text: result.question.text.clone(),
                selected_option_id: result.selected.map(|option| option.id.clone()),
                selected_option_text: result.selected.map(|option| option.text.clone()),
                correct_option_id: result.correct_option.map(|option| option.id.clone()),
                correct_option_text: result.correct_option.map(|option| option.text.clone()),
                is_correct: result.is_correct,
            })
            .collect();

        Self {
            session: SessionResponse::from_db(&material.session, material.subject.duration_minutes),
            subject: SubjectSummary::from_db(&material.subject),
            results,
            correct: scored.score.correct,
            total: scored.score.total,
            percentage: scored.score.percentage,
            grade: scored.score.grade,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportCardRowResponse {
    pub(crate) subject_id: String,
    pub(crate) subject_name: String,
    pub(crate) session_id: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) percentage: f64,
    pub(crate) grade: Grade,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportCardResponse {
    pub(crate) student_id: String,
    pub(crate) rows: Vec<ReportCardRowResponse>,
    pub(crate) overall_percentage: f64,
    pub(crate) overall_grade: Grade,
}

impl ReportCardResponse {
    pub(crate) fn from_card(student_id: String, card: ReportCard) -> Self {
        let rows = card
            .rows
            .into_iter()
            .map(|row| ReportCardRowResponse {
                subject_id: row.subject.id,
                subject_name: row.subject.name,
                session_id: row.session.id,
                completed_at: row.session.completed_at.map(format_primitive),
                correct: row.score.correct,
                total: row.score.total,
                percentage: row.score.percentage,
                grade: row.score.grade,
            })
            .collect();

        Self {
            student_id,
            rows,
            overall_percentage: card.overall_percentage,
            overall_grade: card.overall_grade,
        }
    }
}
