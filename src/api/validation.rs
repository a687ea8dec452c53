use std::collections::BTreeMap;

use crate::api::errors::ApiError;
use crate::db::models::{AnswerOption, Question};
use crate::services::subject_access;

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Trims the class name, maps blank to `None`, and rejects names outside
/// the fixed class list.
pub(crate) fn normalize_class_name(value: Option<&str>) -> Result<Option<&str>, ApiError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(class_name) if subject_access::is_known_class(class_name) => Ok(Some(class_name)),
        Some(class_name) => Err(ApiError::BadRequest(format!("Unknown class '{class_name}'"))),
    }
}

pub(crate) fn validate_time_limit(value: Option<i32>) -> Result<(), ApiError> {
    match value {
        Some(seconds) if !(10..=900).contains(&seconds) => Err(ApiError::BadRequest(
            "time_limit_seconds must be in range 10..900".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Every answer must name a question of the subject and one of that
/// question's options.
pub(crate) fn validate_answers(
    answers: &BTreeMap<String, String>,
    questions: &[Question],
    options: &[AnswerOption],
) -> Result<(), ApiError> {
    for (question_id, option_id) in answers {
        if !questions.iter().any(|question| &question.id == question_id) {
            return Err(ApiError::BadRequest(format!(
                "Question {question_id} does not belong to this subject"
            )));
        }
        let belongs = options
            .iter()
            .any(|option| &option.id == option_id && &option.question_id == question_id);
        if !belongs {
            return Err(ApiError::BadRequest(format!(
                "Option {option_id} is not an option of question {question_id}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn question(id: &str) -> Question {
        let at = datetime!(2025-01-10 10:00:00);
        Question {
            id: id.to_string(),
            subject_id: "subj".to_string(),
            text: "Question".to_string(),
            time_limit_seconds: None,
            order_index: 1,
            created_at: at,
            updated_at: at,
        }
    }

    fn option(id: &str, question_id: &str) -> AnswerOption {
        AnswerOption {
            id: id.to_string(),
            question_id: question_id.to_string(),
            text: id.to_uppercase(),
            is_correct: false,
            created_at: datetime!(2025-01-10 10:00:00),
        }
    }

    #[test]
    fn answers_must_stay_inside_the_subject() {
        let questions = vec![question("q1"), question("q2")];
        let options = vec![option("a", "q1"), option("b", "q2")];

        let ok = BTreeMap::from([("q1".to_string(), "a".to_string())]);
        assert!(validate_answers(&ok, &questions, &options).is_ok());

        let foreign_question = BTreeMap::from([("q9".to_string(), "a".to_string())]);
        assert!(matches!(
            validate_answers(&foreign_question, &questions, &options),
            Err(ApiError::BadRequest(_))
        ));

        let crossed = BTreeMap::from([("q1".to_string(), "b".to_string())]);
        assert!(matches!(
            validate_answers(&crossed, &questions, &options),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada.Obi@Example.COM "), "ada.obi@example.com");
    }

    #[test]
    fn class_name_normalization() {
        assert_eq!(normalize_class_name(None).unwrap(), None);
        assert_eq!(normalize_class_name(Some("   ")).unwrap(), None);
        assert_eq!(normalize_class_name(Some(" SS 1 ")).unwrap(), Some("SS 1"));
        assert!(matches!(normalize_class_name(Some("Year 7")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn time_limit_bounds() {
        assert!(validate_time_limit(None).is_ok());
        assert!(validate_time_limit(Some(10)).is_ok());
        assert!(validate_time_limit(Some(900)).is_ok());
        assert!(validate_time_limit(Some(901)).is_err());
    }
}
