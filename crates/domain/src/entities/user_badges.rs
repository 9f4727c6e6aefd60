//! UserBadges entity - per-user unlocked badge set
//!
//! Append-only: a badge id appears at most once per user, and unlocks are
//! never removed. Unlock order is retained for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BadgeId, UserId};

/// A single unlock with its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeUnlock {
    pub badge_id: BadgeId,
    pub unlocked_at: DateTime<Utc>,
}

/// Outcome of a grant attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// First unlock of this badge for the user
    NewlyUnlocked,
    /// The user already held the badge; nothing changed
    AlreadyHeld,
}

impl GrantOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::NewlyUnlocked)
    }
}

/// The set of badges a user has unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadges {
    user_id: UserId,
    badges: Vec<BadgeUnlock>,
}

impl UserBadges {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            badges: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Unlocks in the order they were earned.
    pub fn unlocks(&self) -> &[BadgeUnlock] {
        &self.badges
    }

    pub fn has(&self, badge_id: &BadgeId) -> bool {
        self.badges.iter().any(|b| &b.badge_id == badge_id)
    }

    pub fn count(&self) -> usize {
        self.badges.len()
    }

    /// Idempotent append: a second grant of the same badge is a no-op.
    pub fn grant(&mut self, badge_id: BadgeId, now: DateTime<Utc>) -> GrantOutcome {
        if self.has(&badge_id) {
            return GrantOutcome::AlreadyHeld;
        }
        self.badges.push(BadgeUnlock {
            badge_id,
            unlocked_at: now,
        });
        GrantOutcome::NewlyUnlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge_id(s: &str) -> BadgeId {
        BadgeId::new(s).expect("valid badge id")
    }

    #[test]
    fn grant_is_idempotent() {
        let mut badges = UserBadges::new(UserId::new("u1").expect("valid user id"));
        let now = Utc::now();

        assert!(badges.grant(badge_id("explorer"), now).is_new());
        assert!(!badges.grant(badge_id("explorer"), now).is_new());
        assert_eq!(badges.count(), 1);
    }

    #[test]
    fn unlock_order_is_retained() {
        let mut badges = UserBadges::new(UserId::new("u1").expect("valid user id"));
        let now = Utc::now();

        badges.grant(badge_id("second"), now);
        badges.grant(badge_id("first"), now);

        let order: Vec<&str> = badges.unlocks().iter().map(|b| b.badge_id.as_str()).collect();
        assert_eq!(order, vec!["second", "first"]);
    }
}
