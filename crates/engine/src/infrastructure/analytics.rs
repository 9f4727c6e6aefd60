//! Tracing-backed analytics sink.
//!
//! Lifecycle events land in the process log under the
//! `questline::analytics` target; a real pipeline would swap in its own
//! `AnalyticsPort` adapter.

use async_trait::async_trait;

use questline_domain::OnboardingEvent;

use crate::infrastructure::ports::{AnalyticsError, AnalyticsPort};

pub struct TracingAnalytics;

impl TracingAnalytics {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingAnalytics {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsPort for TracingAnalytics {
    async fn record(&self, event: &OnboardingEvent) -> Result<(), AnalyticsError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AnalyticsError(format!("event serialization failed: {e}")))?;
        tracing::info!(
            target: "questline::analytics",
            user_id = %event.user_id(),
            event = event.event_type(),
            payload = %payload,
            "Recorded lifecycle event"
        );
        Ok(())
    }
}
