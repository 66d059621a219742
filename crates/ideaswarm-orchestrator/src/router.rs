use crate::notifications::NotificationQueue;
use crate::types::{Task, TaskStatus};
use ideaswarm_core::{Notification, NotificationCategory, Priority, SwarmConfig, SwarmResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// How much scrutiny a flagged task needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewLane {
    /// Confidence reached the review threshold.
    Standard,
    /// Confidence fell below the review threshold.
    Thorough,
}

impl ReviewLane {
    pub fn for_confidence(confidence: f64, config: &SwarmConfig) -> Self {
        if confidence >= config.review_threshold {
            ReviewLane::Standard
        } else {
            ReviewLane::Thorough
        }
    }
}

/// Result of routing one processed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Approved,
    Flagged(ReviewLane),
}

/// Auto-approves confident tasks and escalates the rest for human review.
pub struct ApprovalRouter {
    notifications: Arc<NotificationQueue>,
}

impl ApprovalRouter {
    pub fn new(notifications: Arc<NotificationQueue>) -> Self {
        Self { notifications }
    }

    /// Settle a processing task by its aggregate confidence.
    ///
    /// At or above the auto-approval threshold the task completes. Below it the
    /// task moves to `NeedsReview` and exactly one review notification is queued.
    pub fn route(
        &self,
        task: &mut Task,
        confidence: f64,
        config: &SwarmConfig,
    ) -> SwarmResult<Route> {
        if confidence >= config.auto_approval_threshold {
            task.advance(TaskStatus::Completed)?;
            info!(task_id = %task.id, confidence, "Task auto-approved");
            return Ok(Route::Approved);
        }

        task.advance(TaskStatus::NeedsReview)?;
        let lane = ReviewLane::for_confidence(confidence, config);
        info!(
            task_id = %task.id,
            confidence,
            threshold = config.auto_approval_threshold,
            lane = ?lane,
            "Task flagged for review"
        );

        let notification = Notification::new(
            NotificationCategory::ReviewRequired,
            format!("Low Confidence {} Requires Review", task.kind.subject()),
            format!(
                "Task {} has confidence {:.2} (below threshold {:.2})",
                task.id, confidence, config.auto_approval_threshold
            ),
            Priority::High,
            config.notification_channels.clone(),
        )
        .with_task(task.id.clone())
        .with_details(serde_json::json!({
            "kind": task.kind,
            "confidence": confidence,
            "required": config.auto_approval_threshold,
            "lane": lane,
        }));
        self.notifications.push(notification);

        Ok(Route::Flagged(lane))
    }
}
