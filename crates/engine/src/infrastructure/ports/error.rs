//! Error types shared by the persistence ports.

use std::fmt;

/// Errors surfaced by repository adapters.
///
/// Transient backend failures are retried inside the adapter; what escapes
/// here is already final for the attempt.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found")]
    NotFound,
    /// Conditional write lost the race; re-read and re-apply
    #[error("Version conflict")]
    Conflict,
    #[error("{context} database error: {message}")]
    Database {
        context: &'static str,
        message: String,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub fn database(context: &'static str, err: impl fmt::Display) -> Self {
        Self::Database {
            context,
            message: err.to_string(),
        }
    }

    pub fn serialization(err: impl fmt::Display) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors from the analytics sink. Always swallowed by callers; the type
/// exists so adapters can report what went wrong to the log.
#[derive(Debug, thiserror::Error)]
#[error("Analytics sink error: {0}")]
pub struct AnalyticsError(pub String);
