use std::collections::HashMap;

use crate::db::models::{AnswerOption, Question, StudentResponse};
use crate::services::grading::Grade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Score {
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) percentage: f64,
    pub(crate) grade: Grade,
}

impl Score {
    pub(crate) fn from_counts(correct: usize, total: usize) -> Self {
        let percentage = if total == 0 { 0.0 } else { correct as f64 / total as f64 * 100.0 };
        Self { correct, total, percentage, grade: Grade::from_percentage(percentage) }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionResult<'a> {
    pub(crate) question: &'a Question,
    pub(crate) selected: Option<&'a AnswerOption>,
    pub(crate) correct_option: Option<&'a AnswerOption>,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ScoredSession<'a> {
    pub(crate) results: Vec<QuestionResult<'a>>,
    pub(crate) score: Score,
}

/// Scores one session. `questions` must already be in display order; options
/// may arrive in any order and are ranked by creation time so the first
/// option flagged correct is the designated answer. Questions without a
/// response, without a surviving selected option, or without any correct
/// option count as wrong.
pub(crate) fn score_session<'a>(
    questions: &'a [Question],
    options: &'a [AnswerOption],
    responses: &[StudentResponse],
) -> ScoredSession<'a> {
    let mut options_by_question: HashMap<&str, Vec<&AnswerOption>> = HashMap::new();
    for option in options {
        options_by_question.entry(option.question_id.as_str()).or_default().push(option);
    }
    for list in options_by_question.values_mut() {
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }

    let selected_by_question: HashMap<&str, &str> = responses
        .iter()
        .map(|response| (response.question_id.as_str(), response.selected_option_id.as_str()))
        .collect();

    let results: Vec<QuestionResult<'a>> = questions
        .iter()
        .map(|question| {
            let candidates =
                options_by_question.get(question.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let correct_option = candidates.iter().copied().find(|option| option.is_correct);
            let selected = selected_by_question.get(question.id.as_str()).and_then(|selected_id| {
                candidates.iter().copied().find(|option| option.id == *selected_id)
            });
            let is_correct = matches!(
                (selected, correct_option),
                (Some(selected), Some(correct)) if selected.id == correct.id
            );

            QuestionResult { question, selected, correct_option, is_correct }
        })
        .collect();

    let correct = results.iter().filter(|result| result.is_correct).count();
    let score = Score::from_counts(correct, results.len());

    ScoredSession { results, score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::{Duration, PrimitiveDateTime};

    const BASE: PrimitiveDateTime = datetime!(2025-03-01 08:00:00);

    fn question(id: &str, order_index: i32) -> Question {
        Question {
            id: id.to_string(),
            subject_id: "subject".to_string(),
            text: format!("Question {id}"),
            time_limit_seconds: None,
            order_index,
            created_at: BASE,
            updated_at: BASE,
        }
    }

    fn option(id: &str, question_id: &str, is_correct: bool, minute: i64) -> AnswerOption {
        AnswerOption {
            id: id.to_string(),
            question_id: question_id.to_string(),
            text: format!("Option {id}"),
            is_correct,
            created_at: BASE + Duration::minutes(minute),
        }
    }

    fn response(question_id: &str, option_id: &str) -> StudentResponse {
        StudentResponse {
            id: format!("r-{question_id}"),
            session_id: "session".to_string(),
            question_id: question_id.to_string(),
            selected_option_id: option_id.to_string(),
            created_at: BASE,
            updated_at: BASE,
        }
    }

    fn four_questions() -> (Vec<Question>, Vec<AnswerOption>) {
        let questions = (1..=4).map(|n| question(&format!("q{n}"), n)).collect();
        let options = (1..=4)
            .flat_map(|n| {
                [
                    option(&format!("q{n}-right"), &format!("q{n}"), true, 0),
                    option(&format!("q{n}-wrong"), &format!("q{n}"), false, 1),
                ]
            })
            .collect();
        (questions, options)
    }

    #[test]
    fn three_of_four_is_seventy_five_percent() {
        let (questions, options) = four_questions();
        let responses = vec![
            response("q1", "q1-right"),
            response("q2", "q2-right"),
            response("q3", "q3-right"),
            response("q4", "q4-wrong"),
        ];

        let scored = score_session(&questions, &options, &responses);

        assert_eq!(scored.score.correct, 3);
        assert_eq!(scored.score.total, 4);
        assert_eq!(scored.score.percentage, 75.0);
        assert_eq!(scored.score.grade, Grade::A1);
        assert!(!scored.results[3].is_correct);
        assert_eq!(scored.results[3].correct_option.map(|o| o.id.as_str()), Some("q4-right"));
    }

    #[test]
    fn three_correct_and_one_blank_is_a1() {
        let (questions, options) = four_questions();
        let responses = vec![
            response("q1", "q1-right"),
            response("q2", "q2-right"),
            response("q3", "q3-right"),
        ];

        let scored = score_session(&questions, &options, &responses);

        assert_eq!(scored.score, Score::from_counts(3, 4));
        assert_eq!(scored.score.percentage, 75.0);
        assert_eq!(scored.score.grade, Grade::A1);
        assert!(scored.results[3].selected.is_none());
        assert!(!scored.results[3].is_correct);
    }

    #[test]
    fn unanswered_questions_count_as_wrong() {
        let (questions, options) = four_questions();
        let responses = vec![response("q1", "q1-right"), response("q2", "q2-right")];

        let scored = score_session(&questions, &options, &responses);

        assert_eq!(scored.score.correct, 2);
        assert_eq!(scored.score.percentage, 50.0);
        assert_eq!(scored.score.grade, Grade::C6);
        assert!(scored.results[2].selected.is_none());
    }

    #[test]
    fn question_without_correct_option_is_never_correct() {
        let questions = vec![question("q1", 1)];
        let options = vec![option("a", "q1", false, 0), option("b", "q1", false, 1)];

        let scored = score_session(&questions, &options, &[response("q1", "a")]);

        assert_eq!(scored.score.correct, 0);
        assert!(scored.results[0].correct_option.is_none());
        assert_eq!(scored.results[0].selected.map(|o| o.id.as_str()), Some("a"));
    }

    #[test]
    fn earliest_correct_option_wins() {
        let questions = vec![question("q1", 1)];
        let options = vec![option("late", "q1", true, 5), option("early", "q1", true, 1)];

        let scored = score_session(&questions, &options, &[response("q1", "late")]);

        assert_eq!(scored.results[0].correct_option.map(|o| o.id.as_str()), Some("early"));
        assert!(!scored.results[0].is_correct);
    }

    #[test]
    fn missing_selected_option_is_wrong() {
        let questions = vec![question("q1", 1)];
        let options = vec![option("a", "q1", true, 0)];

        let scored = score_session(&questions, &options, &[response("q1", "deleted")]);

        assert!(scored.results[0].selected.is_none());
        assert_eq!(scored.score.correct, 0);
    }

    #[test]
    fn empty_subject_scores_zero() {
        let scored = score_session(&[], &[], &[]);
        assert_eq!(scored.score, Score::from_counts(0, 0));
        assert_eq!(scored.score.percentage, 0.0);
        assert_eq!(scored.score.grade, Grade::F9);
    }
}
