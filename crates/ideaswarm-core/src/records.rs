use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state of an idea or community post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Flagged,
}

/// A partially filled idea as received from a caller or a discovery source.
///
/// Every field is optional; missing values are filled with defaults when the
/// finalized [`IdeaRecord`] is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeaSubmission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub source_country: Option<String>,
    pub original_idea: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl IdeaSubmission {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// A finalized idea, ready for the caller to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source_url: String,
    pub source_country: String,
    pub original_idea: String,
    /// Localized adaptation produced by the adaptation evaluator.
    pub adaptation: Option<String>,
    /// Overall feasibility score on a 1–10 scale.
    pub feasibility_score: Option<f64>,
    /// Aggregate confidence in [0, 1].
    pub confidence_score: Option<f64>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: ReviewStatus,
    /// Why the idea was flagged, when it was.
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdeaRecord {
    /// Build a pending record from a submission, substituting defaults.
    pub fn from_submission(id: impl Into<String>, submission: &IdeaSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: non_empty(&submission.title).unwrap_or_else(|| "Untitled Idea".to_string()),
            description: submission.description.clone().unwrap_or_default(),
            source_url: submission.source_url.clone().unwrap_or_default(),
            source_country: non_empty(&submission.source_country)
                .unwrap_or_else(|| "Unknown".to_string()),
            original_idea: submission.original_idea.clone().unwrap_or_default(),
            adaptation: None,
            feasibility_score: None,
            confidence_score: None,
            category: non_empty(&submission.category).unwrap_or_else(|| "General".to_string()),
            tags: submission.tags.clone(),
            status: ReviewStatus::Pending,
            review_note: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A free-text question from a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    pub id: String,
    pub user_id: String,
    pub query: String,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

impl UserQuery {
    pub fn new(user_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: format!("q-{}", uuid::Uuid::new_v4().simple()),
            user_id: user_id.into(),
            query: query.into(),
            context: None,
            response: None,
            confidence: None,
            processing_time_ms: None,
            created_at: Utc::now(),
            responded_at: None,
        }
    }
}

/// Kind of community post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Discussion,
    Adaptation,
    SuccessStory,
    Question,
}

/// User-generated content subject to moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub idea_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub moderated_by: Option<String>,
    #[serde(default)]
    pub moderated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunityPost {
    pub fn new(
        user_id: impl Into<String>,
        kind: PostKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("post-{}", uuid::Uuid::new_v4().simple()),
            user_id: user_id.into(),
            idea_id: None,
            kind,
            title: title.into(),
            content: content.into(),
            status: ReviewStatus::Pending,
            moderated_by: None,
            moderated_at: None,
            upvotes: 0,
            downvotes: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a market-analysis run for one idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketReport {
    pub task_id: String,
    pub title: String,
    pub market_score: Option<f64>,
    pub confidence: f64,
    pub status: ReviewStatus,
    pub reasoning: String,
    pub generated_at: DateTime<Utc>,
}

/// Summary of one discovery cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub discovered: usize,
    pub approved: usize,
    pub flagged: usize,
    pub records: Vec<IdeaRecord>,
    /// Set when the cycle was aborted.
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_from_empty_submission() {
        let record = IdeaRecord::from_submission("idea-1", &IdeaSubmission::default());
        assert_eq!(record.title, "Untitled Idea");
        assert_eq!(record.source_country, "Unknown");
        assert_eq!(record.category, "General");
        assert_eq!(record.status, ReviewStatus::Pending);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_blank_title_gets_default() {
        let record = IdeaRecord::from_submission("idea-2", &IdeaSubmission::titled("   "));
        assert_eq!(record.title, "Untitled Idea");
    }

    #[test]
    fn test_submission_accepts_partial_json() {
        let sub: IdeaSubmission =
            serde_json::from_str(r#"{"title": "Smart Farm", "tags": ["IoT"]}"#).unwrap();
        assert_eq!(sub.title.as_deref(), Some("Smart Farm"));
        assert_eq!(sub.tags, vec!["IoT".to_string()]);
        assert!(sub.category.is_none());
    }

    #[test]
    fn test_post_kind_serializes_as_type() {
        let post = CommunityPost::new("u1", PostKind::SuccessStory, "Hi", "We launched");
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["type"], "success_story");
        assert_eq!(json["status"], "pending");
    }
}
