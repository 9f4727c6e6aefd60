//! Badge unlock service.
//!
//! Records unlocks exactly once per (user, badge) pair against an
//! immutable catalog. Unlocks are append-only; nothing here ever removes
//! a badge.

use std::sync::Arc;

use questline_domain::{Badge, BadgeCatalog, BadgeId, UserId};

use crate::infrastructure::ports::{BadgeRepo, ClockPort, RepoError};

/// Errors that can occur during badge operations.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    #[error("Unknown badge: {0}")]
    UnknownBadge(BadgeId),
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl From<RepoError> for BadgeError {
    fn from(err: RepoError) -> Self {
        Self::PersistenceUnavailable(err.to_string())
    }
}

pub struct BadgeService {
    catalog: Arc<BadgeCatalog>,
    repo: Arc<dyn BadgeRepo>,
    clock: Arc<dyn ClockPort>,
}

impl BadgeService {
    pub fn new(
        catalog: Arc<BadgeCatalog>,
        repo: Arc<dyn BadgeRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            catalog,
            repo,
            clock,
        }
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    /// Unlock a badge for a user. Returns `true` when this call newly
    /// unlocked it, `false` when the user already held it. Duplicate
    /// unlocks are never an error.
    pub async fn unlock(&self, user_id: &UserId, badge_id: &BadgeId) -> Result<bool, BadgeError> {
        if !self.catalog.contains(badge_id) {
            return Err(BadgeError::UnknownBadge(badge_id.clone()));
        }

        let newly_unlocked = self
            .repo
            .grant(user_id, badge_id, self.clock.now())
            .await?;
        if newly_unlocked {
            tracing::info!(user_id = %user_id, badge_id = %badge_id, "Badge unlocked");
        }
        Ok(newly_unlocked)
    }

    pub async fn has_badge(&self, user_id: &UserId, badge_id: &BadgeId) -> Result<bool, BadgeError> {
        Ok(self.repo.get(user_id).await?.has(badge_id))
    }

    /// The user's badges in unlock order, resolved against the catalog.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Badge>, BadgeError> {
        let unlocked = self.repo.get(user_id).await?;
        Ok(unlocked
            .unlocks()
            .iter()
            .filter_map(|unlock| {
                let badge = self.catalog.get(&unlock.badge_id);
                if badge.is_none() {
                    tracing::warn!(
                        user_id = %user_id,
                        badge_id = %unlock.badge_id,
                        "Unlocked badge missing from catalog; hiding from listing"
                    );
                }
                badge.cloned()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::MockBadgeRepo;
    use chrono::Utc;
    use questline_domain::{BadgeRarity, UserBadges};

    fn catalog() -> Arc<BadgeCatalog> {
        Arc::new(
            BadgeCatalog::new(vec![Badge::new(
                BadgeId::new("explorer").expect("valid id"),
                "Explorer",
                "Took the tour",
                BadgeRarity::Common,
            )])
            .expect("valid catalog"),
        )
    }

    fn service(repo: MockBadgeRepo) -> BadgeService {
        BadgeService::new(catalog(), Arc::new(repo), Arc::new(FixedClock(Utc::now())))
    }

    #[tokio::test]
    async fn unlock_of_catalog_badge_is_recorded() {
        let mut repo = MockBadgeRepo::new();
        repo.expect_grant().returning(|_, _, _| Ok(true));

        let service = service(repo);
        let user = UserId::new("u1").expect("valid id");
        let badge = BadgeId::new("explorer").expect("valid id");
        assert!(service.unlock(&user, &badge).await.expect("unlock works"));
    }

    #[tokio::test]
    async fn duplicate_unlock_reports_already_held() {
        let mut repo = MockBadgeRepo::new();
        repo.expect_grant().returning(|_, _, _| Ok(false));

        let service = service(repo);
        let user = UserId::new("u1").expect("valid id");
        let badge = BadgeId::new("explorer").expect("valid id");
        assert!(!service.unlock(&user, &badge).await.expect("unlock works"));
    }

    #[tokio::test]
    async fn unknown_badge_is_refused_without_touching_storage() {
        let mut repo = MockBadgeRepo::new();
        repo.expect_grant().times(0);

        let service = service(repo);
        let user = UserId::new("u1").expect("valid id");
        let badge = BadgeId::new("no-such-badge").expect("valid id");
        assert!(matches!(
            service.unlock(&user, &badge).await,
            Err(BadgeError::UnknownBadge(_))
        ));
    }

    #[tokio::test]
    async fn listing_skips_badges_missing_from_catalog() {
        let mut repo = MockBadgeRepo::new();
        repo.expect_get().returning(|user_id| {
            let mut badges = UserBadges::new(user_id.clone());
            badges.grant(BadgeId::new("explorer").expect("valid id"), Utc::now());
            badges.grant(BadgeId::new("ghost").expect("valid id"), Utc::now());
            Ok(badges)
        });

        let service = service(repo);
        let user = UserId::new("u1").expect("valid id");
        let listed = service.list(&user).await.expect("list works");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.as_str(), "explorer");
    }
}
