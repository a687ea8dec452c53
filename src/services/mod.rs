pub(crate) mod exam_timing;
pub(crate) mod grading;
pub(crate) mod reports;
pub(crate) mod scoring;
pub(crate) mod subject_access;
