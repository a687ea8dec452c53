use anyhow::{anyhow, Context, Result};
use sqlx::PgPool;

use crate::db::models::{AnswerOption, ExamSession, Question, StudentResponse, Subject};
use crate::repositories;
use crate::services::grading::Grade;
use crate::services::scoring::{self, Score, ScoredSession};

/// Everything needed to score one session.
#[derive(Debug)]
pub(crate) struct SessionMaterial {
    pub(crate) subject: Subject,
    pub(crate) session: ExamSession,
    pub(crate) questions: Vec<Question>,
    pub(crate) options: Vec<AnswerOption>,
    pub(crate) responses: Vec<StudentResponse>,
}

impl SessionMaterial {
    pub(crate) fn score(&self) -> ScoredSession<'_> {
        scoring::score_session(&self.questions, &self.options, &self.responses)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ReportCardRow {
    pub(crate) subject: Subject,
    pub(crate) session: ExamSession,
    pub(crate) score: Score,
}

#[derive(Debug, Clone)]
pub(crate) struct ReportCard {
    pub(crate) rows: Vec<ReportCardRow>,
    pub(crate) overall_percentage: f64,
    pub(crate) overall_grade: Grade,
}

pub(crate) async fn load_session(pool: &PgPool, session: ExamSession) -> Result<SessionMaterial> {
    let subject = repositories::subjects::find_by_id(pool, &session.subject_id)
        .await
        .context("Failed to fetch subject")?
        .ok_or_else(|| anyhow!("Subject {} not found", session.subject_id))?;
    load_session_for_subject(pool, subject, session).await
}

pub(crate) async fn load_session_for_subject(
    pool: &PgPool,
    subject: Subject,
    session: ExamSession,
) -> Result<SessionMaterial> {
    let questions = repositories::questions::list_by_subject(pool, &subject.id)
        .await
        .context("Failed to fetch questions")?;
    let options = repositories::options::list_by_subject(pool, &subject.id)
        .await
        .context("Failed to fetch options")?;
    let responses = repositories::responses::list_by_session(pool, &session.id)
        .await
        .context("Failed to fetch responses")?;

    Ok(SessionMaterial { subject, session, questions, options, responses })
}

/// One row per subject the student has completed, using the latest
/// completed attempt.
pub(crate) async fn build_report_card(pool: &PgPool, student_id: &str) -> Result<ReportCard> {
    let subjects = repositories::subjects::list_all(pool).await.context("Failed to list subjects")?;

    let mut rows = Vec::new();
    for subject in subjects {
        let Some(session) =
            repositories::sessions::find_latest_completed(pool, &subject.id, student_id)
                .await
                .context("Failed to fetch completed session")?
        else {
            continue;
        };

        let material = load_session_for_subject(pool, subject, session).await?;
        let score = material.score().score;
        rows.push(ReportCardRow { subject: material.subject, session: material.session, score });
    }

    Ok(assemble_report_card(rows))
}

/// Overall percentage is the plain mean of row percentages, 0 with no rows.
pub(crate) fn assemble_report_card(rows: Vec<ReportCardRow>) -> ReportCard {
    let overall_percentage = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|row| row.score.percentage).sum::<f64>() / rows.len() as f64
    };

    ReportCard { rows, overall_percentage, overall_grade: Grade::from_percentage(overall_percentage) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::SessionStatus;
    use time::macros::datetime;

    fn row(name: &str, correct: usize, total: usize) -> ReportCardRow {
        let at = datetime!(2025-04-01 10:00:00);
        ReportCardRow {
            subject: Subject {
                id: format!("subject-{name}"),
                name: name.to_string(),
                description: None,
                duration_minutes: 30,
                class_name: None,
                teacher_id: "teacher".to_string(),
                created_at: at,
                updated_at: at,
            },
            session: ExamSession {
                id: format!("session-{name}"),
                subject_id: format!("subject-{name}"),
                student_id: "student".to_string(),
                started_at: at,
                completed_at: Some(at),
                status: SessionStatus::Completed,
                created_at: at,
                updated_at: at,
            },
            score: Score::from_counts(correct, total),
        }
    }

    #[test]
    fn overall_is_unweighted_mean() {
        // 80% on five questions and 40% on twenty: mean 60, not pooled 48.
        let card = assemble_report_card(vec![row("Maths", 4, 5), row("English", 8, 20)]);

        assert_eq!(card.rows.len(), 2);
        assert!((card.overall_percentage - 60.0).abs() < 1e-9);
        assert_eq!(card.overall_grade, Grade::C4);
    }

    #[test]
    fn empty_card_scores_zero() {
        let card = assemble_report_card(Vec::new());
        assert!(card.rows.is_empty());
        assert_eq!(card.overall_percentage, 0.0);
        assert_eq!(card.overall_grade, Grade::F9);
    }

    #[test]
    fn single_row_overall_matches_row() {
        let card = assemble_report_card(vec![row("Biology", 3, 4)]);
        assert_eq!(card.overall_percentage, 75.0);
        assert_eq!(card.overall_grade, Grade::A1);
    }
}
