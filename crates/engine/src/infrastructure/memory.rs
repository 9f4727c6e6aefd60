//! In-memory adapters for development and testing.
//!
//! Backed by `DashMap` so conditional writes happen under the entry lock,
//! giving the same lost-update protection as the SQLite adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use questline_domain::{
    BadgeId, OnboardingEvent, OnboardingProgress, QuestTemplate, TemplateId, UserBadges, UserId,
};

use crate::infrastructure::ports::{
    AnalyticsError, AnalyticsPort, BadgeRepo, ProgressRepo, RepoError, TemplateRepo,
    VersionedProgress,
};

// =============================================================================
// Templates
// =============================================================================

/// Template catalog held in memory, loaded once at startup.
pub struct InMemoryTemplateRepo {
    templates: DashMap<TemplateId, QuestTemplate>,
    default_id: Option<TemplateId>,
}

impl InMemoryTemplateRepo {
    pub fn new(templates: Vec<QuestTemplate>, default_id: Option<TemplateId>) -> Self {
        let map = DashMap::new();
        for template in templates {
            map.insert(template.id().clone(), template);
        }
        Self {
            templates: map,
            default_id,
        }
    }

    /// Add a template after construction. Used by tests.
    pub fn insert(&self, template: QuestTemplate) {
        self.templates.insert(template.id().clone(), template);
    }

    fn active_sorted(&self) -> Vec<QuestTemplate> {
        let mut active: Vec<QuestTemplate> = self
            .templates
            .iter()
            .filter(|entry| entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        active
    }
}

#[async_trait]
impl TemplateRepo for InMemoryTemplateRepo {
    async fn get(&self, id: &TemplateId) -> Result<Option<QuestTemplate>, RepoError> {
        Ok(self.templates.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_default(&self) -> Result<Option<QuestTemplate>, RepoError> {
        if let Some(id) = &self.default_id {
            return Ok(self.templates.get(id).map(|entry| entry.value().clone()));
        }
        // No designated default: fall back to the newest active template.
        Ok(self.active_sorted().into_iter().next())
    }

    async fn list_active(&self) -> Result<Vec<QuestTemplate>, RepoError> {
        Ok(self.active_sorted())
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Progress records keyed by user, with version CAS under the entry lock.
#[derive(Default)]
pub struct InMemoryProgressRepo {
    records: DashMap<UserId, VersionedProgress>,
}

impl InMemoryProgressRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepo for InMemoryProgressRepo {
    async fn get(&self, user_id: &UserId) -> Result<Option<VersionedProgress>, RepoError> {
        Ok(self.records.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, progress: &OnboardingProgress) -> Result<VersionedProgress, RepoError> {
        match self.records.entry(progress.user_id().clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RepoError::Conflict),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let stored = VersionedProgress {
                    progress: progress.clone(),
                    version: 1,
                };
                vacant.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn update(
        &self,
        progress: &OnboardingProgress,
        expected_version: u64,
    ) -> Result<VersionedProgress, RepoError> {
        let mut entry = self
            .records
            .get_mut(progress.user_id())
            .ok_or(RepoError::NotFound)?;
        if entry.version != expected_version {
            return Err(RepoError::Conflict);
        }
        entry.progress = progress.clone();
        entry.version += 1;
        Ok(entry.value().clone())
    }
}

// =============================================================================
// Badges
// =============================================================================

/// Per-user unlocked badge sets.
#[derive(Default)]
pub struct InMemoryBadgeRepo {
    records: DashMap<UserId, UserBadges>,
}

impl InMemoryBadgeRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BadgeRepo for InMemoryBadgeRepo {
    async fn get(&self, user_id: &UserId) -> Result<UserBadges, RepoError> {
        Ok(self
            .records
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| UserBadges::new(user_id.clone())))
    }

    async fn grant(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let mut entry = self
            .records
            .entry(user_id.clone())
            .or_insert_with(|| UserBadges::new(user_id.clone()));
        Ok(entry.grant(badge_id.clone(), unlocked_at).is_new())
    }
}

// =============================================================================
// Analytics
// =============================================================================

/// Analytics sink that records events for assertions in tests.
#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<OnboardingEvent>>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<OnboardingEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AnalyticsPort for RecordingAnalytics {
    async fn record(&self, event: &OnboardingEvent) -> Result<(), AnalyticsError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_domain::StepDefinition;

    fn user(s: &str) -> UserId {
        UserId::new(s).expect("valid user id")
    }

    fn template(id: &str, created_at: DateTime<Utc>, active: bool) -> QuestTemplate {
        QuestTemplate::new(
            TemplateId::new(id).expect("valid id"),
            id.to_string(),
            vec![StepDefinition::new(
                questline_domain::StepId::new("only").expect("valid id"),
                "Only",
                1,
                10,
                true,
            )],
            created_at,
        )
        .expect("valid template")
        .with_active(active)
    }

    #[tokio::test]
    async fn create_refuses_existing_progress() {
        let repo = InMemoryProgressRepo::new();
        let t = template("t", Utc::now(), true);
        let progress = OnboardingProgress::start(user("u1"), &t, Utc::now());

        repo.create(&progress).await.expect("first create works");
        assert!(matches!(
            repo.create(&progress).await,
            Err(RepoError::Conflict)
        ));
    }

    #[tokio::test]
    async fn update_enforces_expected_version() {
        let repo = InMemoryProgressRepo::new();
        let t = template("t", Utc::now(), true);
        let progress = OnboardingProgress::start(user("u1"), &t, Utc::now());

        let stored = repo.create(&progress).await.expect("create works");
        assert_eq!(stored.version, 1);

        let updated = repo
            .update(&progress, stored.version)
            .await
            .expect("matching version wins");
        assert_eq!(updated.version, 2);

        // Stale version loses
        assert!(matches!(
            repo.update(&progress, stored.version).await,
            Err(RepoError::Conflict)
        ));
    }

    #[tokio::test]
    async fn badge_grant_is_idempotent() {
        let repo = InMemoryBadgeRepo::new();
        let badge = BadgeId::new("explorer").expect("valid id");
        let now = Utc::now();

        assert!(repo.grant(&user("u1"), &badge, now).await.expect("grant works"));
        assert!(!repo.grant(&user("u1"), &badge, now).await.expect("grant works"));

        let badges = repo.get(&user("u1")).await.expect("get works");
        assert_eq!(badges.count(), 1);
    }

    #[tokio::test]
    async fn default_template_falls_back_to_newest_active() {
        let old = Utc::now() - chrono::Duration::days(2);
        let newer = Utc::now() - chrono::Duration::days(1);
        let repo = InMemoryTemplateRepo::new(
            vec![
                template("old", old, true),
                template("newer", newer, true),
                template("inactive", Utc::now(), false),
            ],
            None,
        );

        let picked = repo
            .get_default()
            .await
            .expect("lookup works")
            .expect("a default exists");
        assert_eq!(picked.id().as_str(), "newer");
    }
}
