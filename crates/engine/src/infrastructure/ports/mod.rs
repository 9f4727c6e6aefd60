//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - Persistence (could swap SQLite -> Postgres or any document store)
//! - Change notification (could swap in-process watch -> message bus)
//! - Analytics (could swap log sink -> event pipeline)
//! - Clock (for testing)

mod error;
mod notify;
mod repos;
mod testing;

pub use error::{AnalyticsError, RepoError};
pub use notify::{AnalyticsPort, ProgressNotifierPort};
pub use repos::{BadgeRepo, ProgressRepo, TemplateRepo, VersionedProgress};
pub use testing::ClockPort;

#[cfg(test)]
pub use notify::MockAnalyticsPort;
#[cfg(test)]
pub use repos::{MockBadgeRepo, MockProgressRepo, MockTemplateRepo};
#[cfg(test)]
pub use testing::MockClockPort;
