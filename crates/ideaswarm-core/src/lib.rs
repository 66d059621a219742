//! Core types and error definitions for the IdeaSwarm evaluation engine.
//!
//! This crate holds everything shared between the orchestrator and its callers:
//! error handling, runtime configuration, the idea/query/post records that flow
//! in and out of the pipeline, and escalation notifications.
//!
//! # Main types
//!
//! - [`SwarmError`]: Unified error enum for all IdeaSwarm subsystems.
//! - [`SwarmResult`]: Convenience alias for `Result<T, SwarmError>`.
//! - [`SwarmConfig`]: Thresholds, intervals and feature flags for the orchestrator.
//! - [`Notification`]: Queued escalation or error event awaiting delivery.
//! - [`IdeaSubmission`] / [`IdeaRecord`]: Partial input idea and its finalized record.

/// Runtime configuration and partial updates.
pub mod config;
/// Escalation and error notifications.
pub mod notification;
/// Records exchanged with callers (ideas, queries, community posts).
pub mod records;

pub use config::{ConfigPatch, FeatureFlags, NotificationChannel, SwarmConfig};
pub use notification::{Notification, NotificationCategory};
pub use records::{
    CommunityPost, DiscoveryReport, IdeaRecord, IdeaSubmission, MarketReport, PostKind,
    ReviewStatus, UserQuery,
};

use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for IdeaSwarm.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    /// A capability provider failed to produce an opinion.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The candidate discovery collaborator failed.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Sub-task results could not be merged into a decision.
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An internal fault in the orchestration pipeline.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`SwarmError`].
pub type SwarmResult<T> = Result<T, SwarmError>;

// --- Shared enums ---

/// Urgency attached to tasks and notifications.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background work.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// Processed ahead of medium work.
    High,
    /// Processed first.
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_error_display() {
        let err = SwarmError::Provider("model unavailable".to_string());
        assert_eq!(err.to_string(), "Provider error: model unavailable");
    }
}
