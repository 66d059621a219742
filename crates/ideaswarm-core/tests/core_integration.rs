#![allow(clippy::unwrap_used, clippy::expect_used)]

use ideaswarm_core::*;
use std::io::Write;

// ---------------------------------------------------------------------------
// 1. Config file loading and patching
// ---------------------------------------------------------------------------

#[test]
fn config_file_roundtrip_and_patch() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
auto_approval_threshold = 0.85
batch_size = 4
discovery_cron = "0 0 9 * * * *"
notification_channels = ["slack"]

[features]
enforce_deadline = false
"#
    )
    .unwrap();

    let raw = std::fs::read_to_string(file.path()).unwrap();
    let config = SwarmConfig::from_toml_str(&raw).unwrap();
    assert_eq!(config.auto_approval_threshold, 0.85);
    assert_eq!(config.review_threshold, 0.7);
    assert_eq!(config.batch_size, 4);
    assert_eq!(config.discovery_cron.as_deref(), Some("0 0 9 * * * *"));
    assert_eq!(config.notification_channels, vec![NotificationChannel::Slack]);
    assert!(!config.features.enforce_deadline);
    assert!(config.features.memory);

    // The same file read as a patch only touches the keys it names.
    let patch = ConfigPatch::from_toml_str(&raw).unwrap();
    assert!(patch.max_processing_time_ms.is_none());
    let merged = SwarmConfig::default().apply(&patch).unwrap();
    assert_eq!(merged, config);
}

#[test]
fn invalid_patch_leaves_config_untouched() {
    let config = SwarmConfig::default();
    let patch = ConfigPatch {
        review_threshold: Some(0.95),
        ..ConfigPatch::default()
    };
    let err = config.apply(&patch).unwrap_err();
    assert!(matches!(err, SwarmError::Config(_)));
    assert_eq!(config, SwarmConfig::default());
}

#[test]
fn malformed_toml_is_config_error() {
    let err = SwarmConfig::from_toml_str("batch_size = \"many\"").unwrap_err();
    assert!(err.to_string().starts_with("Config error"));
}

// ---------------------------------------------------------------------------
// 2. Notification lifecycle
// ---------------------------------------------------------------------------

#[test]
fn notification_serialization_and_read_state() {
    let mut note = Notification::new(
        NotificationCategory::ReviewRequired,
        "Low Confidence Idea Requires Review",
        "Task idea-1 has confidence 0.50 (below threshold 0.90)",
        Priority::High,
        vec![NotificationChannel::Email],
    )
    .with_task("idea-1")
    .with_details(serde_json::json!({"lane": "thorough"}));

    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["category"], "review_required");
    assert_eq!(json["priority"], "high");
    assert_eq!(json["task_id"], "idea-1");
    assert_eq!(json["is_read"], false);

    assert!(note.mark_read());
    let read_at = note.read_at;
    assert!(!note.mark_read());
    assert_eq!(note.read_at, read_at);

    let back: Notification = serde_json::from_value(serde_json::to_value(&note).unwrap()).unwrap();
    assert!(back.is_read);
    assert_eq!(back.details["lane"], "thorough");
}

// ---------------------------------------------------------------------------
// 3. Records
// ---------------------------------------------------------------------------

#[test]
fn idea_submission_from_caller_json() {
    let submission: IdeaSubmission = serde_json::from_str(
        r#"{"title": "Local Food Delivery Network", "tags": ["Food", "Local"], "unknown": 1}"#,
    )
    .unwrap();
    let record = IdeaRecord::from_submission("idea-42", &submission);
    assert_eq!(record.id, "idea-42");
    assert_eq!(record.title, "Local Food Delivery Network");
    assert_eq!(record.category, "General");
    assert_eq!(record.tags, vec!["Food", "Local"]);
    assert_eq!(record.status, ReviewStatus::Pending);
}

#[test]
fn community_post_and_query_ids() {
    let post = CommunityPost::new("user-1", PostKind::SuccessStory, "We launched", "Details");
    assert!(post.id.starts_with("post-"));
    let json = serde_json::to_value(&post).unwrap();
    assert_eq!(json["type"], "success_story");

    let a = UserQuery::new("user-1", "hello");
    let b = UserQuery::new("user-1", "hello");
    assert_ne!(a.id, b.id);
    assert!(a.response.is_none());
}

// ---------------------------------------------------------------------------
// 4. Error conversions
// ---------------------------------------------------------------------------

#[test]
fn error_conversions() {
    fn parse(raw: &str) -> SwarmResult<serde_json::Value> {
        Ok(serde_json::from_str(raw)?)
    }
    assert!(matches!(parse("{"), Err(SwarmError::Json(_))));

    fn read() -> SwarmResult<String> {
        Ok(std::fs::read_to_string("/nonexistent/ideaswarm.toml")?)
    }
    assert!(matches!(read(), Err(SwarmError::Io(_))));
}
