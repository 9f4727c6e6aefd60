//! Repository port traits for persistence access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use questline_domain::{
    BadgeId, OnboardingProgress, QuestTemplate, TemplateId, UserBadges, UserId,
};

use super::error::RepoError;

/// A progress record together with its optimistic-concurrency token.
///
/// The version belongs to the storage layer, not the domain: adapters bump
/// it on every successful conditional write.
#[derive(Debug, Clone)]
pub struct VersionedProgress {
    pub progress: OnboardingProgress,
    pub version: u64,
}

// =============================================================================
// Template Catalog Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRepo: Send + Sync {
    async fn get(&self, id: &TemplateId) -> Result<Option<QuestTemplate>, RepoError>;

    /// The designated default template for initializations with no
    /// explicit template id.
    async fn get_default(&self) -> Result<Option<QuestTemplate>, RepoError>;

    /// Active templates, newest first.
    async fn list_active(&self) -> Result<Vec<QuestTemplate>, RepoError>;
}

// =============================================================================
// Progress Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepo: Send + Sync {
    async fn get(&self, user_id: &UserId) -> Result<Option<VersionedProgress>, RepoError>;

    /// Insert a fresh record. Fails with `Conflict` when the user already
    /// has progress (initialization must never reset it).
    async fn create(&self, progress: &OnboardingProgress) -> Result<VersionedProgress, RepoError>;

    /// Conditional write: applies only when the stored version still equals
    /// `expected_version`, otherwise fails with `Conflict`. This is the
    /// guard against lost updates from concurrent transitions.
    async fn update(
        &self,
        progress: &OnboardingProgress,
        expected_version: u64,
    ) -> Result<VersionedProgress, RepoError>;
}

// =============================================================================
// Badge Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepo: Send + Sync {
    /// The user's unlocked badges; an empty set when none were recorded.
    async fn get(&self, user_id: &UserId) -> Result<UserBadges, RepoError>;

    /// Atomic, idempotent append. Returns `true` when this call newly
    /// recorded the unlock, `false` when the user already held the badge.
    async fn grant(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<bool, RepoError>;
}
