//! Merges settled sub-task results into one decision record.
//!
//! Aggregation is a pure function of the result set: results are sorted by
//! sub-task id before anything is read, so arrival order never changes the
//! outcome. Missing opinion fields fall back to defaults; fields that are
//! present but unusable turn the whole decision into a zero-confidence
//! error record instead of raising.

use crate::dispatch::DEFAULT_CONFIDENCE;
use crate::types::SubTaskResult;
use ideaswarm_core::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

const SCORE_KEYS: &[&str] = &["overallScore", "feasibilityScore", "score"];
const QUALITY_KEYS: &[&str] = &["qualityScore"];
const ADAPTATION_KEYS: &[&str] = &["adaptation", "koreanAdaptation", "adaptedIdea"];
const RESPONSE_KEYS: &[&str] = &["response", "answer", "summary"];

/// Upper bound of the score scale.
pub const SCORE_SCALE: f64 = 10.0;

/// The merged outcome of one composite task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Overall score on a 0–10 scale.
    pub overall_score: Option<f64>,
    pub quality_score: Option<f64>,
    /// `false` as soon as any opinion reports inappropriate content.
    pub appropriate: Option<bool>,
    pub adaptation: Option<String>,
    pub response: Option<String>,
    pub reasoning: Option<String>,
    pub key_changes: Vec<String>,
    pub succeeded: usize,
    pub failed: usize,
    /// Aggregate confidence in [0, 1].
    pub confidence: f64,
    /// Error marker set when synthesis failed.
    pub error: Option<String>,
}

impl Decision {
    /// Minimal decision carrying an error marker and zero confidence.
    pub fn failed(marker: impl Into<String>) -> Self {
        Self {
            overall_score: None,
            quality_score: None,
            appropriate: None,
            adaptation: None,
            response: None,
            reasoning: None,
            key_changes: Vec::new(),
            succeeded: 0,
            failed: 0,
            confidence: 0.0,
            error: Some(marker.into()),
        }
    }
}

/// Unweighted mean of the three confidence factors, clamped to [0, 1].
///
/// Absent scores count as 0.5 after normalization.
pub fn combined_confidence(mean_intrinsic: f64, score: Option<f64>, quality: Option<f64>) -> f64 {
    let factors = [
        mean_intrinsic,
        score.map_or(DEFAULT_CONFIDENCE, |s| s / SCORE_SCALE),
        quality.map_or(DEFAULT_CONFIDENCE, |q| q / SCORE_SCALE),
    ];
    let mean = factors.iter().sum::<f64>() / factors.len() as f64;
    if mean.is_finite() {
        mean.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Merge a set of sub-task results. Never fails.
pub fn aggregate(results: &[SubTaskResult]) -> Decision {
    let mut sorted: Vec<&SubTaskResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.subtask_id.cmp(&b.subtask_id));

    let succeeded = sorted.iter().filter(|r| r.succeeded()).count();
    let failed = sorted.len() - succeeded;

    let mut decision = synthesize(&sorted).unwrap_or_else(|e| {
        warn!(error = %e, "Aggregation failed, returning zero-confidence decision");
        Decision::failed(e.to_string())
    });
    decision.succeeded = succeeded;
    decision.failed = failed;
    decision
}

fn synthesize(results: &[&SubTaskResult]) -> SwarmResult<Decision> {
    let opinions: Vec<&Value> = results
        .iter()
        .filter(|r| r.succeeded())
        .filter_map(|r| r.opinion.as_ref())
        .collect();

    if !results.is_empty() && results.iter().all(|r| !r.succeeded()) {
        let first = results
            .iter()
            .find_map(|r| r.error.as_deref())
            .unwrap_or("unknown error");
        return Err(SwarmError::Aggregation(format!(
            "all {} sub-tasks failed (first: {first})",
            results.len()
        )));
    }

    let mean_intrinsic = if results.is_empty() {
        DEFAULT_CONFIDENCE
    } else {
        results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64
    };

    let overall_score = mean_of(&opinions, SCORE_KEYS)?;
    let quality_score = mean_of(&opinions, QUALITY_KEYS)?;
    let appropriate = appropriateness(&opinions)?;

    let mut key_changes: Vec<String> = Vec::new();
    for change in opinions
        .iter()
        .filter_map(|o| o.get("keyChanges").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
    {
        if !key_changes.iter().any(|c| c == change) {
            key_changes.push(change.to_string());
        }
    }

    Ok(Decision {
        overall_score,
        quality_score,
        appropriate,
        adaptation: joined_text(&opinions, ADAPTATION_KEYS),
        response: joined_text(&opinions, RESPONSE_KEYS),
        reasoning: joined_text(&opinions, &["reasoning"]),
        key_changes,
        succeeded: 0,
        failed: 0,
        confidence: combined_confidence(mean_intrinsic, overall_score, quality_score),
        error: None,
    })
}

/// Mean of the first matching numeric key per opinion, clamped to the score scale.
fn mean_of(opinions: &[&Value], keys: &[&str]) -> SwarmResult<Option<f64>> {
    let mut values = Vec::new();
    for opinion in opinions {
        if let Some(v) = numeric_field(opinion, keys)? {
            values.push(v.clamp(0.0, SCORE_SCALE));
        }
    }
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

fn numeric_field(opinion: &Value, keys: &[&str]) -> SwarmResult<Option<f64>> {
    for key in keys {
        let parsed = match opinion.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        return match parsed {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(SwarmError::Aggregation(format!(
                "field '{key}' is not a finite number"
            ))),
        };
    }
    Ok(None)
}

fn appropriateness(opinions: &[&Value]) -> SwarmResult<Option<bool>> {
    let mut verdict: Option<bool> = None;
    for opinion in opinions {
        match opinion.get("isAppropriate") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => verdict = Some(verdict.unwrap_or(true) && *b),
            Some(_) => {
                return Err(SwarmError::Aggregation(
                    "field 'isAppropriate' is not a boolean".to_string(),
                ))
            }
        }
    }
    Ok(verdict)
}

fn joined_text(opinions: &[&Value], keys: &[&str]) -> Option<String> {
    let parts: Vec<&str> = opinions
        .iter()
        .filter_map(|o| keys.iter().find_map(|k| o.get(*k).and_then(Value::as_str)))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
