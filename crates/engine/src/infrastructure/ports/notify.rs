//! Outbound ports for change notification and analytics.

use async_trait::async_trait;
use tokio::sync::watch;

use questline_domain::{OnboardingEvent, OnboardingProgress, UserId};

use super::error::AnalyticsError;

/// Fan-out of progress snapshots to watchers (UI sessions, schedulers).
///
/// Delivery is at-most-once per state version with no guarantee across
/// process restarts; reconnecting consumers should re-fetch the snapshot.
pub trait ProgressNotifierPort: Send + Sync {
    /// Push a fresh snapshot to this user's watchers. Infallible: a user
    /// with no watchers is not an error.
    fn publish(&self, progress: &OnboardingProgress);

    /// Watch a user's progress. The receiver holds the last snapshot
    /// published in this process (`None` before the first publish);
    /// dropping the receiver unsubscribes.
    fn subscribe(&self, user_id: &UserId) -> watch::Receiver<Option<OnboardingProgress>>;
}

/// Best-effort lifecycle event sink.
///
/// Callers never propagate failures from this port; a broken sink must not
/// fail a progress transition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsPort: Send + Sync {
    async fn record(&self, event: &OnboardingEvent) -> Result<(), AnalyticsError>;
}
