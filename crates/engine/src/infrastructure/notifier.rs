//! In-process progress fan-out over per-user watch channels.
//!
//! `tokio::sync::watch` gives exactly the delivery contract the engine
//! promises: a subscriber sees the latest snapshot immediately, updates are
//! coalesced to at-most-once per state version, and nothing survives a
//! process restart.

use dashmap::DashMap;
use tokio::sync::watch;

use questline_domain::{OnboardingProgress, UserId};

use crate::infrastructure::ports::ProgressNotifierPort;

type Snapshot = Option<OnboardingProgress>;

/// Per-user watch-channel hub.
#[derive(Default)]
pub struct ProgressNotifier {
    channels: DashMap<UserId, watch::Sender<Snapshot>>,
}

impl ProgressNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, user_id: &UserId) -> watch::Sender<Snapshot> {
        self.channels
            .entry(user_id.clone())
            .or_insert_with(|| watch::channel(None).0)
            .clone()
    }
}

impl ProgressNotifierPort for ProgressNotifier {
    fn publish(&self, progress: &OnboardingProgress) {
        let sender = self.sender(progress.user_id());
        // send_replace stores the value even when no watcher is attached
        sender.send_replace(Some(progress.clone()));
        tracing::debug!(
            user_id = %progress.user_id(),
            completion = progress.completion_percentage(),
            "Published progress snapshot"
        );
    }

    fn subscribe(&self, user_id: &UserId) -> watch::Receiver<Snapshot> {
        self.sender(user_id).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use questline_domain::{QuestTemplate, StepDefinition, StepId, TemplateId};

    fn sample_progress(user: &str) -> OnboardingProgress {
        let template = QuestTemplate::new(
            TemplateId::new("t").expect("valid id"),
            "T",
            vec![StepDefinition::new(
                StepId::new("s1").expect("valid id"),
                "S1",
                1,
                10,
                true,
            )],
            Utc::now(),
        )
        .expect("valid template");
        OnboardingProgress::start(
            UserId::new(user).expect("valid id"),
            &template,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn subscriber_sees_snapshot_published_before_subscribing() {
        let notifier = ProgressNotifier::new();
        let progress = sample_progress("u1");

        notifier.publish(&progress);
        let rx = notifier.subscribe(progress.user_id());
        assert!(rx.borrow().is_some());
    }

    #[tokio::test]
    async fn subscriber_receives_later_publishes() {
        let notifier = ProgressNotifier::new();
        let progress = sample_progress("u1");

        let mut rx = notifier.subscribe(progress.user_id());
        assert!(rx.borrow().is_none());

        notifier.publish(&progress);
        rx.changed().await.expect("sender alive");
        assert!(rx.borrow_and_update().is_some());
    }

    #[tokio::test]
    async fn users_have_independent_channels() {
        let notifier = ProgressNotifier::new();
        let p1 = sample_progress("u1");

        notifier.publish(&p1);
        let other = notifier.subscribe(&UserId::new("u2").expect("valid id"));
        assert!(other.borrow().is_none());
    }
}
