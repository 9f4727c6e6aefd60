//! Best-effort side effects of a successful transition.
//!
//! Analytics and change notification must never fail the transition that
//! triggered them: failures are logged and swallowed here.

use std::sync::Arc;

use questline_domain::{OnboardingEvent, OnboardingProgress};

use crate::infrastructure::ports::{AnalyticsPort, ProgressNotifierPort};

/// Shared by every transition use case.
#[derive(Clone)]
pub struct TransitionEffects {
    analytics: Arc<dyn AnalyticsPort>,
    notifier: Arc<dyn ProgressNotifierPort>,
}

impl TransitionEffects {
    pub fn new(analytics: Arc<dyn AnalyticsPort>, notifier: Arc<dyn ProgressNotifierPort>) -> Self {
        Self {
            analytics,
            notifier,
        }
    }

    /// Record a lifecycle event; a failing sink is logged and ignored.
    pub async fn emit(&self, event: OnboardingEvent) {
        if let Err(e) = self.analytics.record(&event).await {
            tracing::warn!(
                user_id = %event.user_id(),
                event = event.event_type(),
                error = %e,
                "Analytics sink failed; continuing"
            );
        }
    }

    /// Push the new snapshot to this user's watchers.
    pub fn publish(&self, progress: &OnboardingProgress) {
        self.notifier.publish(progress);
    }
}
