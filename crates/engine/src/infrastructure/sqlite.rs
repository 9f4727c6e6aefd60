//! SQLite-backed persistence for progress and badges.
//!
//! Progress records are stored as one JSON document per user with a
//! `version` column; updates are conditional on the expected version so
//! concurrent transitions cannot silently drop each other's writes. Badge
//! unlocks use `INSERT OR IGNORE` against a composite primary key, which
//! makes the grant atomic and idempotent in a single statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use questline_domain::{BadgeId, OnboardingProgress, UserBadges, UserId};

use crate::infrastructure::ports::{
    BadgeRepo, ClockPort, ProgressRepo, RepoError, VersionedProgress,
};

/// Open (or create) the database and ensure the schema exists.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("questline", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS onboarding_progress (
            user_id TEXT PRIMARY KEY,
            record_json TEXT NOT NULL,
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .map_err(|e| RepoError::database("progress", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_badges (
            user_id TEXT NOT NULL,
            badge_id TEXT NOT NULL,
            unlocked_at TEXT NOT NULL,
            PRIMARY KEY (user_id, badge_id)
        )
        "#,
    )
    .execute(&pool)
    .await
    .map_err(|e| RepoError::database("badges", e))?;

    Ok(pool)
}

// =============================================================================
// Progress
// =============================================================================

pub struct SqliteProgressRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteProgressRepo {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl ProgressRepo for SqliteProgressRepo {
    async fn get(&self, user_id: &UserId) -> Result<Option<VersionedProgress>, RepoError> {
        let row = sqlx::query(
            "SELECT record_json, version FROM onboarding_progress WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("progress", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("record_json");
                let version: i64 = row.get("version");
                let progress =
                    serde_json::from_str(&json).map_err(RepoError::serialization)?;
                Ok(Some(VersionedProgress {
                    progress,
                    version: version as u64,
                }))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, progress: &OnboardingProgress) -> Result<VersionedProgress, RepoError> {
        let json = serde_json::to_string(progress).map_err(RepoError::serialization)?;
        let now = self.clock.now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO onboarding_progress (user_id, record_json, version, updated_at)
            VALUES (?, ?, 1, ?)
            "#,
        )
        .bind(progress.user_id().as_str())
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("progress", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::Conflict);
        }
        Ok(VersionedProgress {
            progress: progress.clone(),
            version: 1,
        })
    }

    async fn update(
        &self,
        progress: &OnboardingProgress,
        expected_version: u64,
    ) -> Result<VersionedProgress, RepoError> {
        let json = serde_json::to_string(progress).map_err(RepoError::serialization)?;
        let now = self.clock.now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE onboarding_progress
            SET record_json = ?, version = version + 1, updated_at = ?
            WHERE user_id = ? AND version = ?
            "#,
        )
        .bind(json)
        .bind(now)
        .bind(progress.user_id().as_str())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("progress", e))?;

        if result.rows_affected() == 0 {
            // Distinguish a missing record from a lost race
            let exists =
                sqlx::query("SELECT 1 FROM onboarding_progress WHERE user_id = ?")
                    .bind(progress.user_id().as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| RepoError::database("progress", e))?;
            return Err(if exists.is_some() {
                RepoError::Conflict
            } else {
                RepoError::NotFound
            });
        }

        Ok(VersionedProgress {
            progress: progress.clone(),
            version: expected_version + 1,
        })
    }
}

// =============================================================================
// Badges
// =============================================================================

pub struct SqliteBadgeRepo {
    pool: SqlitePool,
}

impl SqliteBadgeRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BadgeRepo for SqliteBadgeRepo {
    async fn get(&self, user_id: &UserId) -> Result<UserBadges, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT badge_id, unlocked_at FROM user_badges
            WHERE user_id = ?
            ORDER BY unlocked_at, badge_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("badges", e))?;

        let mut badges = UserBadges::new(user_id.clone());
        for row in rows {
            let badge_id: String = row.get("badge_id");
            let unlocked_at: String = row.get("unlocked_at");
            let badge_id = BadgeId::new(badge_id).map_err(RepoError::serialization)?;
            let unlocked_at = DateTime::parse_from_rfc3339(&unlocked_at)
                .map_err(RepoError::serialization)?
                .with_timezone(&Utc);
            badges.grant(badge_id, unlocked_at);
        }
        Ok(badges)
    }

    async fn grant(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_badges (user_id, badge_id, unlocked_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id.as_str())
        .bind(badge_id.as_str())
        .bind(unlocked_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("badges", e))?;

        Ok(result.rows_affected() == 1)
    }
}
