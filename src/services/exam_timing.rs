//! Session timing rules: when a start request resumes or replaces a session,
//! what a view does to an expired attempt, and whether late writes are
//! accepted. Everything here is pure; callers persist the outcome.

use thiserror::Error;
use time::{Duration, PrimitiveDateTime};

use crate::core::config::ExamSettings;
use crate::db::types::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Active,
    ExpiredUnanswered,
    ExpiredAnswered,
    Completed,
}

impl Phase {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ExpiredUnanswered => "expired_unanswered",
            Self::ExpiredAnswered => "expired_answered",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartDecision {
    /// No open session: create one starting now.
    Create,
    /// The open session still has time left.
    Resume,
    /// The open session ran out of time: mark it expired and create a new one.
    Supersede,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewDecision {
    Render { remaining_seconds: i64 },
    /// Unanswered and out of time: restart the same session from now.
    Restart,
    /// Out of time with answers on record. `mark_expired` is set when the
    /// stored status has not caught up yet.
    Lapse { mark_expired: bool },
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TimingError {
    #[error("Session already submitted")]
    AlreadySubmitted,
    #[error("Session has expired")]
    Expired,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SubmissionPolicy {
    pub(crate) strict_deadline: bool,
    pub(crate) grace_seconds: i64,
}

impl SubmissionPolicy {
    pub(crate) fn from_settings(settings: &ExamSettings) -> Self {
        Self {
            strict_deadline: settings.strict_deadline,
            grace_seconds: i64::try_from(settings.submit_grace_seconds).unwrap_or(i64::MAX),
        }
    }
}

pub(crate) fn deadline(started_at: PrimitiveDateTime, duration_minutes: i32) -> PrimitiveDateTime {
    started_at + Duration::minutes(i64::from(duration_minutes))
}

/// Whole seconds left before the deadline, never negative.
pub(crate) fn remaining_seconds(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> i64 {
    (deadline(started_at, duration_minutes) - now).whole_seconds().max(0)
}

pub(crate) fn full_duration_seconds(duration_minutes: i32) -> i64 {
    i64::from(duration_minutes) * 60
}

pub(crate) fn classify(
    status: SessionStatus,
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    has_responses: bool,
    now: PrimitiveDateTime,
) -> Phase {
    let out_of_time = match status {
        SessionStatus::Completed => return Phase::Completed,
        SessionStatus::Expired => true,
        SessionStatus::Active => now >= deadline(started_at, duration_minutes),
    };

    match (out_of_time, has_responses) {
        (false, _) => Phase::Active,
        (true, false) => Phase::ExpiredUnanswered,
        (true, true) => Phase::ExpiredAnswered,
    }
}

/// `open_started_at` is the start of the latest session still marked active.
pub(crate) fn decide_start(
    open_started_at: Option<PrimitiveDateTime>,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> StartDecision {
    match open_started_at {
        None => StartDecision::Create,
        Some(started_at) if now < deadline(started_at, duration_minutes) => StartDecision::Resume,
        Some(_) => StartDecision::Supersede,
    }
}

pub(crate) fn decide_view(
    status: SessionStatus,
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    has_responses: bool,
    now: PrimitiveDateTime,
) -> ViewDecision {
    match classify(status, started_at, duration_minutes, has_responses, now) {
        Phase::Active => ViewDecision::Render {
            remaining_seconds: remaining_seconds(started_at, duration_minutes, now),
        },
        // A session already superseded by a newer one stays closed.
        Phase::ExpiredUnanswered if status == SessionStatus::Active => ViewDecision::Restart,
        Phase::ExpiredUnanswered | Phase::ExpiredAnswered => {
            ViewDecision::Lapse { mark_expired: status == SessionStatus::Active }
        }
        Phase::Completed => ViewDecision::Closed,
    }
}

/// Gate for saving or submitting answers.
pub(crate) fn check_write(
    status: SessionStatus,
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
    policy: SubmissionPolicy,
) -> Result<(), TimingError> {
    if status == SessionStatus::Completed {
        return Err(TimingError::AlreadySubmitted);
    }

    if policy.strict_deadline {
        let cutoff =
            deadline(started_at, duration_minutes) + Duration::seconds(policy.grace_seconds);
        if now > cutoff {
            return Err(TimingError::Expired);
        }
    }

    Ok(())
}
