//! Best-effort status reporting.
//!
//! The reconciler posts a one-line summary after each pass. The sink is an
//! injected capability so the engine carries no ambient dependency on any
//! particular delivery channel; failures inside a sink must be swallowed.

use async_trait::async_trait;
use tracing::info;

/// Free-text status sink. Implementations must not propagate errors.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn report_status(&self, summary: &str);
}

/// Default sink: emits the summary as a structured log line.
pub struct LogStatusSink;

#[async_trait]
impl StatusSink for LogStatusSink {
    async fn report_status(&self, summary: &str) {
        info!(target: "clipledger::status", "{summary}");
    }
}
