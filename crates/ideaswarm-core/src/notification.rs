use crate::config::NotificationChannel;
use crate::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// A task fell below the auto-approval threshold.
    ReviewRequired,
    /// A pipeline or discovery cycle failed.
    SwarmError,
    /// Aggregate metrics crossed an alerting threshold.
    PerformanceAlert,
    /// Configuration or lifecycle change.
    SystemUpdate,
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationCategory::ReviewRequired => write!(f, "review_required"),
            NotificationCategory::SwarmError => write!(f, "swarm_error"),
            NotificationCategory::PerformanceAlert => write!(f, "performance_alert"),
            NotificationCategory::SystemUpdate => write!(f, "system_update"),
        }
    }
}

/// An event queued for external delivery.
///
/// Only `is_read` / `read_at` change after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub channels: Vec<NotificationChannel>,
    /// Task this notification refers to, if any.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Structured payload (achieved/required confidence, error text, ...).
    #[serde(default)]
    pub details: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
        channels: Vec<NotificationChannel>,
    ) -> Self {
        Self {
            id: format!("notification-{}", Uuid::new_v4().simple()),
            category,
            title: title.into(),
            message: message.into(),
            priority,
            channels,
            task_id: None,
            details: serde_json::Value::Null,
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Mark as read. Returns `false` (and changes nothing) if already read.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(Utc::now());
        true
    }
}
