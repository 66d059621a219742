use crate::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};

/// Delivery channel a notification should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Slack,
    Sms,
}

/// Optional behaviours of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Reserved for feedback-driven tuning of evaluator weights.
    #[serde(default = "default_true")]
    pub reinforcement_learning: bool,
    /// Reserved for cross-task evaluator memory.
    #[serde(default = "default_true")]
    pub memory: bool,
    /// Cancel capability calls that exceed `max_processing_time_ms`.
    /// When disabled, overruns are only recorded as soft failures.
    #[serde(default = "default_true")]
    pub enforce_deadline: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            reinforcement_learning: true,
            memory: true,
            enforce_deadline: true,
        }
    }
}

/// Orchestrator configuration.
///
/// Every in-flight task works against an immutable snapshot of this struct;
/// updates only affect tasks started afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Confidence at or above which a task is approved without review.
    #[serde(default = "default_auto_approval_threshold")]
    pub auto_approval_threshold: f64,
    /// Confidence below which a review is marked as thorough.
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,
    /// Ceiling for a single capability call, in milliseconds.
    #[serde(default = "default_max_processing_time_ms")]
    pub max_processing_time_ms: u64,
    /// Maximum number of queued tasks drained per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,
    #[serde(default = "default_metrics_interval_ms")]
    pub metrics_interval_ms: u64,
    /// Number of candidates requested per discovery cycle.
    #[serde(default = "default_discovery_count")]
    pub discovery_count: usize,
    /// 7-field cron expression for the scheduled discovery cycle.
    #[serde(default)]
    pub discovery_cron: Option<String>,
    /// Maximum notifications retained in memory.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
    /// Error rate above which a performance alert is raised.
    #[serde(default = "default_alert_error_rate")]
    pub alert_error_rate: f64,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default = "default_channels")]
    pub notification_channels: Vec<NotificationChannel>,
}

fn default_true() -> bool {
    true
}
fn default_auto_approval_threshold() -> f64 {
    0.9
}
fn default_review_threshold() -> f64 {
    0.7
}
fn default_max_processing_time_ms() -> u64 {
    30_000
}
fn default_batch_size() -> usize {
    10
}
fn default_drain_interval_ms() -> u64 {
    30_000
}
fn default_metrics_interval_ms() -> u64 {
    60_000
}
fn default_discovery_count() -> usize {
    5
}
fn default_notification_capacity() -> usize {
    500
}
fn default_alert_error_rate() -> f64 {
    0.25
}
fn default_channels() -> Vec<NotificationChannel> {
    vec![NotificationChannel::Email, NotificationChannel::Slack]
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            auto_approval_threshold: default_auto_approval_threshold(),
            review_threshold: default_review_threshold(),
            max_processing_time_ms: default_max_processing_time_ms(),
            batch_size: default_batch_size(),
            drain_interval_ms: default_drain_interval_ms(),
            metrics_interval_ms: default_metrics_interval_ms(),
            discovery_count: default_discovery_count(),
            discovery_cron: None,
            notification_capacity: default_notification_capacity(),
            alert_error_rate: default_alert_error_rate(),
            features: FeatureFlags::default(),
            notification_channels: default_channels(),
        }
    }
}

impl SwarmConfig {
    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(raw: &str) -> SwarmResult<Self> {
        let config: SwarmConfig =
            toml::from_str(raw).map_err(|e| SwarmError::Config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> SwarmResult<()> {
        for (name, value) in [
            ("auto_approval_threshold", self.auto_approval_threshold),
            ("review_threshold", self.review_threshold),
            ("alert_error_rate", self.alert_error_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SwarmError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.review_threshold > self.auto_approval_threshold {
            return Err(SwarmError::Config(format!(
                "review_threshold ({}) must not exceed auto_approval_threshold ({})",
                self.review_threshold, self.auto_approval_threshold
            )));
        }
        if self.batch_size == 0 {
            return Err(SwarmError::Config("batch_size must be at least 1".into()));
        }
        if self.notification_capacity == 0 {
            return Err(SwarmError::Config(
                "notification_capacity must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("max_processing_time_ms", self.max_processing_time_ms),
            ("drain_interval_ms", self.drain_interval_ms),
            ("metrics_interval_ms", self.metrics_interval_ms),
        ] {
            if value == 0 {
                return Err(SwarmError::Config(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    /// Merge a partial update into a copy of this config and validate the result.
    pub fn apply(&self, patch: &ConfigPatch) -> SwarmResult<SwarmConfig> {
        let mut next = self.clone();
        if let Some(v) = patch.auto_approval_threshold {
            next.auto_approval_threshold = v;
        }
        if let Some(v) = patch.review_threshold {
            next.review_threshold = v;
        }
        if let Some(v) = patch.max_processing_time_ms {
            next.max_processing_time_ms = v;
        }
        if let Some(v) = patch.batch_size {
            next.batch_size = v;
        }
        if let Some(v) = patch.drain_interval_ms {
            next.drain_interval_ms = v;
        }
        if let Some(v) = patch.metrics_interval_ms {
            next.metrics_interval_ms = v;
        }
        if let Some(v) = patch.discovery_count {
            next.discovery_count = v;
        }
        if let Some(v) = &patch.discovery_cron {
            next.discovery_cron = if v.trim().is_empty() {
                None
            } else {
                Some(v.clone())
            };
        }
        if let Some(v) = patch.notification_capacity {
            next.notification_capacity = v;
        }
        if let Some(v) = patch.alert_error_rate {
            next.alert_error_rate = v;
        }
        if let Some(v) = &patch.features {
            next.features = v.clone();
        }
        if let Some(v) = &patch.notification_channels {
            next.notification_channels = v.clone();
        }
        next.validate()?;
        Ok(next)
    }
}

/// A partial [`SwarmConfig`]. Absent fields keep their current value.
///
/// An empty `discovery_cron` string clears the schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub auto_approval_threshold: Option<f64>,
    #[serde(default)]
    pub review_threshold: Option<f64>,
    #[serde(default)]
    pub max_processing_time_ms: Option<u64>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub drain_interval_ms: Option<u64>,
    #[serde(default)]
    pub metrics_interval_ms: Option<u64>,
    #[serde(default)]
    pub discovery_count: Option<usize>,
    #[serde(default)]
    pub discovery_cron: Option<String>,
    #[serde(default)]
    pub notification_capacity: Option<usize>,
    #[serde(default)]
    pub alert_error_rate: Option<f64>,
    #[serde(default)]
    pub features: Option<FeatureFlags>,
    #[serde(default)]
    pub notification_channels: Option<Vec<NotificationChannel>>,
}

impl ConfigPatch {
    /// Parse a (possibly partial) TOML document into a patch.
    pub fn from_toml_str(raw: &str) -> SwarmResult<Self> {
        toml::from_str(raw).map_err(|e| SwarmError::Config(format!("Invalid config patch: {e}")))
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }
}
