use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Exam lifecycle outcomes recorded under `exam_sessions_total`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SessionEvent {
    Started,
    Resumed,
    Restarted,
    Expired,
    Submitted,
}

impl SessionEvent {
    fn label(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Resumed => "resumed",
            Self::Restarted => "restarted",
            Self::Expired => "expired",
            Self::Submitted => "submitted",
        }
    }
}

pub(crate) fn record_session_event(event: SessionEvent) {
    metrics::counter!("exam_sessions_total", "outcome" => event.label()).increment(1);
}

pub(crate) fn record_score(percentage: f64) {
    metrics::histogram!("exam_score_percentage").record(percentage);
}
