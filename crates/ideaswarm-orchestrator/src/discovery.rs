use async_trait::async_trait;
use ideaswarm_core::{IdeaSubmission, SwarmError, SwarmResult};
use std::path::Path;
use tracing::info;

/// Supplier of candidate ideas for the discovery cycle.
#[async_trait]
pub trait IdeaSource: Send + Sync {
    /// Return up to `count` candidates. Fewer is fine.
    async fn discover(&self, count: usize) -> SwarmResult<Vec<IdeaSubmission>>;
}

/// Serves candidates from a fixed in-memory catalog.
pub struct CatalogSource {
    ideas: Vec<IdeaSubmission>,
}

impl CatalogSource {
    pub fn new(ideas: Vec<IdeaSubmission>) -> Self {
        Self { ideas }
    }

    /// Load a JSON array of submissions.
    pub fn from_json_file(path: impl AsRef<Path>) -> SwarmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let ideas: Vec<IdeaSubmission> = serde_json::from_str(&raw).map_err(|e| {
            SwarmError::Discovery(format!("Invalid catalog {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), ideas = ideas.len(), "Loaded discovery catalog");
        Ok(Self { ideas })
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self::new(sample_ideas())
    }
}

#[async_trait]
impl IdeaSource for CatalogSource {
    async fn discover(&self, count: usize) -> SwarmResult<Vec<IdeaSubmission>> {
        Ok(self.ideas.iter().take(count).cloned().collect())
    }
}

fn idea(
    title: &str,
    description: &str,
    source_url: &str,
    source_country: &str,
    original_idea: &str,
    category: &str,
    tags: &[&str],
) -> IdeaSubmission {
    IdeaSubmission {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        source_url: Some(source_url.to_string()),
        source_country: Some(source_country.to_string()),
        original_idea: Some(original_idea.to_string()),
        category: Some(category.to_string()),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
    }
}

/// The built-in catalog.
pub fn sample_ideas() -> Vec<IdeaSubmission> {
    vec![
        idea(
            "AI-Powered Personal Stylist",
            "Virtual stylist that recommends outfits based on personal style and occasion",
            "https://techcrunch.com/2024/01/15/ai-stylist-startup",
            "US",
            "AI-powered personal styling service with virtual try-on",
            "Fashion",
            &["AI", "Fashion", "Personalization", "E-commerce"],
        ),
        idea(
            "Smart Home Energy Management",
            "IoT system that optimizes home energy usage based on patterns and preferences",
            "https://venturebeat.com/2024/01/20/smart-energy-startup",
            "Germany",
            "Smart home energy management with AI optimization",
            "IoT",
            &["IoT", "Energy", "Sustainability", "Smart Home"],
        ),
        idea(
            "Mental Health AI Companion",
            "AI-powered mental health support with mood tracking and personalized interventions",
            "https://producthunt.com/posts/mental-health-ai",
            "UK",
            "AI mental health companion with 24/7 support",
            "Health",
            &["AI", "Mental Health", "Wellness", "Healthcare"],
        ),
        idea(
            "Local Food Delivery Network",
            "Platform connecting local farmers with consumers for fresh produce delivery",
            "https://crunchbase.com/organization/farm-fresh-delivery",
            "Canada",
            "Farm-to-table delivery platform",
            "Food",
            &["Food", "Local", "Sustainability", "Delivery"],
        ),
        idea(
            "Language Learning Social Network",
            "Social platform for language learners to practice with native speakers",
            "https://twitter.com/langlearnapp",
            "Spain",
            "Social language learning platform",
            "Education",
            &["Education", "Language", "Social", "Learning"],
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_default_catalog() {
        let source = CatalogSource::default();
        assert_eq!(source.len(), 5);
        let ideas = source.discover(3).await.unwrap();
        assert_eq!(ideas.len(), 3);
        assert_eq!(ideas[0].title.as_deref(), Some("AI-Powered Personal Stylist"));
    }

    #[tokio::test]
    async fn test_discover_returns_at_most_catalog() {
        let source = CatalogSource::default();
        assert_eq!(source.discover(50).await.unwrap().len(), 5);
        assert!(source.discover(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Pet Care Marketplace", "category": "Pets"}}, {{}}]"#
        )
        .unwrap();

        let source = CatalogSource::from_json_file(file.path()).unwrap();
        assert_eq!(source.len(), 2);
        let ideas = source.discover(5).await.unwrap();
        assert_eq!(ideas[0].category.as_deref(), Some("Pets"));
        assert!(ideas[1].title.is_none());
    }

    #[test]
    fn test_invalid_catalog_is_discovery_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = CatalogSource::from_json_file(file.path()).err().unwrap();
        assert!(matches!(err, SwarmError::Discovery(_)));
        assert!(CatalogSource::from_json_file("/nonexistent/catalog.json").is_err());
    }
}
