use crate::db::models::{Subject, User};

/// Class names a student or subject may be tagged with.
pub(crate) const CLASS_CHOICES: &[&str] = &[
    "Primary 1",
    "Primary 2",
    "Primary 3",
    "Primary 4",
    "Primary 5",
    "Primary 6",
    "JSS 1",
    "JSS 2",
    "JSS 3",
    "SS 1",
    "SS 2",
    "SS 3",
];

pub(crate) fn is_known_class(class_name: &str) -> bool {
    CLASS_CHOICES.contains(&class_name)
}

/// Unscoped subjects are open to everyone, and a student without a class
/// sees every subject. Otherwise the names must match exactly.
pub(crate) fn visible_to_class(subject_class: Option<&str>, student_class: Option<&str>) -> bool {
    match (subject_class, student_class) {
        (None, _) | (_, None) => true,
        (Some(subject), Some(student)) => subject == student,
    }
}

pub(crate) fn visible_to_student(subject: &Subject, student: &User) -> bool {
    visible_to_class(subject.class_name.as_deref(), student.class_name.as_deref())
}

pub(crate) fn owned_by(subject: &Subject, teacher: &User) -> bool {
    subject.teacher_id == teacher.id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_subject_is_visible_to_all() {
        assert!(visible_to_class(None, Some("JSS 1")));
        assert!(visible_to_class(None, None));
    }

    #[test]
    fn scoped_subject_requires_matching_class() {
        assert!(visible_to_class(Some("SS 2"), Some("SS 2")));
        assert!(!visible_to_class(Some("SS 2"), Some("SS 3")));
        assert!(!visible_to_class(Some("SS 2"), Some("ss 2")));
    }

    #[test]
    fn student_without_class_sees_scoped_subjects() {
        assert!(visible_to_class(Some("Primary 4"), None));
    }

    #[test]
    fn class_choices_cover_three_levels() {
        assert_eq!(CLASS_CHOICES.len(), 12);
        assert!(is_known_class("Primary 6"));
        assert!(is_known_class("JSS 3"));
        assert!(!is_known_class("JSS 4"));
        assert!(!is_known_class("Grade 10"));
    }
}
