//! Built-in deterministic capability provider.
//!
//! [`RuleProvider`] derives every opinion from the input alone, without network
//! access. It backs the CLI and makes end-to-end runs reproducible.

use crate::dispatch::{CapabilityProvider, Opinion};
use crate::types::AgentRole;
use async_trait::async_trait;
use ideaswarm_core::SwarmResult;
use serde_json::{json, Value};

const BLOCKED_TERMS: &[&str] = &["spam", "scam", "buy now", "click here", "free money"];

/// Category weights applied on top of the base feasibility score.
const CATEGORY_BONUS: &[(&str, f64)] = &[
    ("education", 1.5),
    ("health", 1.0),
    ("iot", 1.0),
    ("food", 0.5),
    ("fashion", 0.5),
];

const BASE_SCORE: f64 = 6.0;

/// Rule-based evaluator for every role.
#[derive(Debug, Clone, Default)]
pub struct RuleProvider;

impl RuleProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CapabilityProvider for RuleProvider {
    async fn invoke(&self, role: AgentRole, input: &Value) -> SwarmResult<Opinion> {
        let mut opinion = match role {
            AgentRole::Sourcing => sourcing(input),
            AgentRole::Scoring => scoring(input),
            AgentRole::Adaptation => adaptation(input),
            AgentRole::Moderation => moderation(input),
            AgentRole::Master => Opinion::new(json!({})),
        };
        if let Some(query) = text(input, "query") {
            opinion.value["response"] = Value::String(answer(role, query));
        }
        Ok(opinion)
    }
}

fn text<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn tags(input: &Value) -> Vec<String> {
    input
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

fn sourcing(input: &Value) -> Opinion {
    let url = text(input, "source_url");
    let verified = url.is_some_and(|u| u.starts_with("https://") || u.starts_with("http://"));
    let country = text(input, "source_country").unwrap_or("Unknown");
    let reasoning = if verified {
        format!("Source verified ({country})")
    } else {
        "No verifiable source URL".to_string()
    };
    Opinion::new(json!({
        "verified": verified,
        "sourceCountry": country,
        "reasoning": reasoning,
    }))
    .with_confidence(if verified { 0.9 } else { 0.6 })
}

/// Feasibility on a 0–10 scale from category, tags and description depth.
pub fn feasibility_score(input: &Value) -> f64 {
    let mut score = BASE_SCORE;
    if let Some(category) = text(input, "category") {
        let category = category.to_lowercase();
        score += CATEGORY_BONUS
            .iter()
            .find(|(name, _)| *name == category)
            .map_or(0.0, |(_, bonus)| *bonus);
    }
    if tags(input).iter().any(|t| t == "ai") {
        score += 0.5;
    }
    if text(input, "description").is_some_and(|d| d.split_whitespace().count() >= 8) {
        score += 0.5;
    }
    score.clamp(0.0, 10.0)
}

fn scoring(input: &Value) -> Opinion {
    let score = feasibility_score(input);
    let title = text(input, "title").unwrap_or("this idea");
    Opinion::new(json!({
        "feasibilityScore": score,
        "reasoning": format!("Feasibility of {title} estimated at {score:.1}/10"),
    }))
    .with_confidence(0.88)
}

fn adaptation(input: &Value) -> Opinion {
    let title = text(input, "title").unwrap_or("Untitled Idea");
    let filled = ["title", "description", "source_url", "original_idea", "category"]
        .iter()
        .filter(|k| text(input, k).is_some())
        .count();
    let quality = 5.0 + filled as f64;
    Opinion::new(json!({
        "koreanAdaptation": format!(
            "{title} localized for the Korean market with KakaoTalk login and local payments"
        ),
        "keyChanges": ["KakaoTalk integration", "Korean cultural content", "Local payment systems"],
        "qualityScore": quality,
    }))
    .with_confidence(0.92)
}

fn moderation(input: &Value) -> Opinion {
    let body = [text(input, "title"), text(input, "content")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let lowered = body.to_lowercase();
    let hits: Vec<&str> = BLOCKED_TERMS
        .iter()
        .copied()
        .filter(|t| lowered.contains(t))
        .collect();
    let words = body.split_whitespace().count();
    let quality = (4.0 + words as f64 / 5.0).min(10.0);
    Opinion::new(json!({
        "isAppropriate": hits.is_empty(),
        "blockedTerms": hits,
        "qualityScore": quality,
    }))
    .with_confidence(0.9)
}

fn answer(role: AgentRole, query: &str) -> String {
    match role {
        AgentRole::Sourcing => format!("Sources related to \"{query}\" are tracked by the sourcing agent"),
        AgentRole::Scoring => format!("Market assessment for \"{query}\": moderate potential"),
        AgentRole::Adaptation => format!("Localization notes for \"{query}\": adapt payments and messaging"),
        AgentRole::Moderation => format!("\"{query}\" was checked against community guidelines"),
        AgentRole::Master => format!("Received \"{query}\""),
    }
}
