use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AnswerOption, Question, Subject};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 2, max = 120, message = "name must be 2..120 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub(crate) description: Option<String>,
    #[validate(range(min = 5, max = 300, message = "duration_minutes must be in range 5..300"))]
    pub(crate) duration_minutes: i32,
    #[serde(default)]
    pub(crate) class_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    #[validate(length(min = 2, max = 120, message = "name must be 2..120 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::nullable")]
    pub(crate) description: Option<Option<String>>,
    #[serde(default)]
    #[validate(range(min = 5, max = 300, message = "duration_minutes must be in range 5..300"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default, deserialize_with = "crate::schemas::nullable")]
    pub(crate) class_name: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 3, message = "text must be at least 3 characters"))]
    pub(crate) text: String,
    #[serde(default)]
    #[validate(range(min = 10, max = 900, message = "time_limit_seconds must be in range 10..900"))]
    pub(crate) time_limit_seconds: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(length(min = 3, message = "text must be at least 3 characters"))]
    pub(crate) text: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::nullable")]
    pub(crate) time_limit_seconds: Option<Option<i32>>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[validate(length(min = 1, max = 500, message = "text must be 1..500 characters"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "text must be 1..500 characters"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) class_name: Option<String>,
    pub(crate) teacher_id: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SubjectResponse {
    pub(crate) fn from_db(subject: Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            description: subject.description,
            duration_minutes: subject.duration_minutes,
            class_name: subject.class_name,
            teacher_id: subject.teacher_id,
            created_at: format_primitive(subject.created_at),
            updated_at: format_primitive(subject.updated_at),
        }
    }
}

/// Compact subject header embedded in exam views and reports.
#[derive(Debug, Serialize)]
pub(crate) struct SubjectSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) duration_minutes: i32,
}

impl SubjectSummary {
    pub(crate) fn from_db(subject: &Subject) -> Self {
        Self {
            id: subject.id.clone(),
            name: subject.name.clone(),
            duration_minutes: subject.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
}

impl OptionResponse {
    pub(crate) fn from_db(option: AnswerOption) -> Self {
        Self {
            id: option.id,
            question_id: option.question_id,
            text: option.text,
            is_correct: option.is_correct,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) text: String,
    pub(crate) time_limit_seconds: Option<i32>,
    pub(crate) order_index: i32,
    pub(crate) options: Vec<OptionResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question, options: Vec<OptionResponse>) -> Self {
        Self {
            id: question.id,
            subject_id: question.subject_id,
            text: question.text,
            time_limit_seconds: question.time_limit_seconds,
            order_index: question.order_index,
            options,
        }
    }
}

/// Teacher view of a subject with its full question bank, answers included.
#[derive(Debug, Serialize)]
pub(crate) struct SubjectDetailResponse {
    #[serde(flatten)]
    pub(crate) subject: SubjectResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl SubjectDetailResponse {
    pub(crate) fn assemble(
        subject: Subject,
        questions: Vec<Question>,
        options: Vec<AnswerOption>,
    ) -> Self {
        let mut remaining = options;
        let questions = questions
            .into_iter()
            .map(|question| {
                let (own, rest): (Vec<_>, Vec<_>) =
                    remaining.drain(..).partition(|option| option.question_id == question.id);
                remaining = rest;
                let options = own.into_iter().map(OptionResponse::from_db).collect();
                QuestionResponse::from_db(question, options)
            })
            .collect();

        Self { subject: SubjectResponse::from_db(subject), questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn subject_with_duration(duration_minutes: i32) -> SubjectCreate {
        SubjectCreate {
            name: "Maths".to_string(),
            description: None,
            duration_minutes,
            class_name: None,
        }
    }

    #[test]
    fn create_enforces_duration_bounds() {
        assert!(subject_with_duration(4).validate().is_err());
        assert!(subject_with_duration(5).validate().is_ok());
        assert!(subject_with_duration(300).validate().is_ok());
        assert!(subject_with_duration(301).validate().is_err());
    }

    #[test]
    fn question_time_limit_is_optional_but_bounded() {
        let no_limit = QuestionCreate { text: "What is 2 + 2?".to_string(), time_limit_seconds: None };
        let bounded = QuestionCreate { text: "Why?".to_string(), time_limit_seconds: Some(9) };
        let short_text = QuestionCreate { text: "Hi".to_string(), time_limit_seconds: Some(60) };

        assert!(no_limit.validate().is_ok());
        assert!(bounded.validate().is_err());
        assert!(short_text.validate().is_err());
    }

    #[test]
    fn detail_groups_options_under_their_question() {
        let at = datetime!(2025-02-01 12:00:00);
        let subject = Subject {
            id: "s1".to_string(),
            name: "Civic Education".to_string(),
            description: None,
            duration_minutes: 20,
            class_name: Some("JSS 2".to_string()),
            teacher_id: "t1".to_string(),
            created_at: at,
            updated_at: at,
        };
        let question = |id: &str, order_index| Question {
            id: id.to_string(),
            subject_id: "s1".to_string(),
            text: format!("Question {id}"),
            time_limit_seconds: None,
            order_index,
            created_at: at,
            updated_at: at,
        };
        let option = |id: &str, question_id: &str| AnswerOption {
            id: id.to_string(),
            question_id: question_id.to_string(),
            text: id.to_uppercase(),
            is_correct: false,
            created_at: at,
        };

        let detail = SubjectDetailResponse::assemble(
            subject,
            vec![question("q1", 1), question("q2", 2)],
            vec![option("a", "q1"), option("b", "q2"), option("c", "q1")],
        );

        assert_eq!(detail.questions.len(), 2);
        let first: Vec<_> = detail.questions[0].options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(detail.questions[1].options.len(), 1);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Civic Education");
        assert_eq!(json["questions"][1]["options"][0]["id"], "b");
    }
}
