use crate::registry::{AgentRegistry, RunOutcome};
use crate::types::{AgentRole, SubTask, SubTaskResult};
use async_trait::async_trait;
use futures_util::future::join_all;
use ideaswarm_core::{SwarmConfig, SwarmResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Confidence assumed when a provider does not report one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A role-specific opinion returned by a capability provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub value: serde_json::Value,
    /// Intrinsic confidence. When absent, a numeric `confidence` field inside
    /// `value` is used, then [`DEFAULT_CONFIDENCE`].
    pub confidence: Option<f64>,
}

impl Opinion {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Effective intrinsic confidence, always within [0, 1].
    pub fn intrinsic_confidence(&self) -> f64 {
        let raw = self
            .confidence
            .or_else(|| self.value.get("confidence").and_then(serde_json::Value::as_f64));
        match raw {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => DEFAULT_CONFIDENCE,
        }
    }
}

/// Black-box evaluator backend: a rule engine, a remote model, a test fixture.
///
/// Implementations should return within the configured processing-time
/// ceiling; errors are captured per sub-task and never abort siblings.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn invoke(&self, role: AgentRole, input: &serde_json::Value) -> SwarmResult<Opinion>;
}

/// Keyword table in priority order.
const ROLE_KEYWORDS: [(AgentRole, &[&str]); 4] = [
    (AgentRole::Sourcing, &["source", "discover", "find"]),
    (AgentRole::Scoring, &["score", "feasibility", "market"]),
    (AgentRole::Adaptation, &["adapt", "korean", "localize"]),
    (AgentRole::Moderation, &["moderate", "content", "quality"]),
];

/// Pick a role for an input by substring match over its JSON serialization.
///
/// Roles are checked in the order sourcing, scoring, adaptation, moderation;
/// the first match wins. Falls back to scoring.
pub fn classify_role(input: &serde_json::Value) -> AgentRole {
    let view = input.to_string().to_lowercase();
    ROLE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| view.contains(k)))
        .map_or(AgentRole::Scoring, |(role, _)| *role)
}

/// The decomposer's planned role, or the classifier's pick.
pub fn resolve_role(subtask: &SubTask) -> AgentRole {
    subtask
        .planned_role
        .unwrap_or_else(|| classify_role(&subtask.input))
}

/// Time limits applied to each capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    pub ceiling: Duration,
    /// Cancel at the ceiling instead of only recording the overrun.
    pub enforce_deadline: bool,
}

impl DispatchPolicy {
    pub fn from_config(config: &SwarmConfig) -> Self {
        Self {
            ceiling: Duration::from_millis(config.max_processing_time_ms),
            enforce_deadline: config.features.enforce_deadline,
        }
    }
}

/// Runs sub-tasks against a [`CapabilityProvider`] and feeds the registry.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn CapabilityProvider>,
    registry: Arc<AgentRegistry>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn CapabilityProvider>, registry: Arc<AgentRegistry>) -> Self {
        Self { provider, registry }
    }

    /// Run every sub-task concurrently and wait until all have settled.
    ///
    /// Results come back in input order. Provider errors, deadline expiries and
    /// panics each become an error-shaped result for that sub-task only.
    pub async fn dispatch_all(
        &self,
        subtasks: Vec<SubTask>,
        policy: DispatchPolicy,
    ) -> Vec<SubTaskResult> {
        let mut meta = Vec::with_capacity(subtasks.len());
        let mut handles = Vec::with_capacity(subtasks.len());

        for subtask in subtasks {
            let role = resolve_role(&subtask);
            meta.push((subtask.id.clone(), role));
            let provider = self.provider.clone();
            handles.push(tokio::spawn(async move {
                run_one(provider.as_ref(), &subtask, role, policy).await
            }));
        }

        let joined = join_all(handles).await;
        let mut results = Vec::with_capacity(joined.len());
        for ((subtask_id, role), outcome) in meta.into_iter().zip(joined) {
            let result = outcome.unwrap_or_else(|e| {
                warn!(subtask_id = %subtask_id, role = %role, error = %e, "Sub-task aborted");
                SubTaskResult::failure(subtask_id, role, format!("sub-task aborted: {e}"), 0)
            });
            self.registry
                .record(
                    role,
                    RunOutcome {
                        success: result.succeeded(),
                        confidence: result.confidence,
                        latency_ms: result.latency_ms,
                        soft_failure: result.timed_out || result.overran,
                    },
                )
                .await;
            results.push(result);
        }
        results
    }
}

async fn run_one(
    provider: &dyn CapabilityProvider,
    subtask: &SubTask,
    role: AgentRole,
    policy: DispatchPolicy,
) -> SubTaskResult {
    debug!(subtask_id = %subtask.id, role = %role, "Dispatching sub-task");
    let started = Instant::now();
    let call = provider.invoke(role, &subtask.input);

    let outcome = if policy.enforce_deadline {
        tokio::time::timeout(policy.ceiling, call).await.ok()
    } else {
        Some(call.await)
    };
    let elapsed = started.elapsed();
    let latency_ms = elapsed.as_millis() as u64;

    match outcome {
        None => {
            warn!(
                subtask_id = %subtask.id,
                role = %role,
                ceiling_ms = policy.ceiling.as_millis() as u64,
                "Capability call cancelled at deadline"
            );
            let mut result = SubTaskResult::failure(
                &subtask.id,
                role,
                format!(
                    "capability call exceeded {} ms",
                    policy.ceiling.as_millis()
                ),
                latency_ms,
            );
            result.timed_out = true;
            result
        }
        Some(Err(e)) => {
            warn!(subtask_id = %subtask.id, role = %role, error = %e, "Capability call failed");
            SubTaskResult::failure(&subtask.id, role, e.to_string(), latency_ms)
        }
        Some(Ok(opinion)) => {
            let overran = elapsed > policy.ceiling;
            if overran {
                warn!(
                    subtask_id = %subtask.id,
                    role = %role,
                    latency_ms,
                    "Capability call overran the processing-time ceiling"
                );
            }
            SubTaskResult {
                subtask_id: subtask.id.clone(),
                role,
                confidence: opinion.intrinsic_confidence(),
                opinion: Some(opinion.value),
                error: None,
                latency_ms,
                timed_out: false,
                overran,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ideaswarm_core::SwarmError;
    use serde_json::json;

    #[test]
    fn test_classifier_priority_order() {
        assert_eq!(classify_role(&json!({"q": "find a source"})), AgentRole::Sourcing);
        // "discover" beats "market"
        assert_eq!(
            classify_role(&json!({"q": "discover market leaders"})),
            AgentRole::Sourcing
        );
        assert_eq!(classify_role(&json!({"q": "feasibility of X"})), AgentRole::Scoring);
        assert_eq!(
            classify_role(&json!({"q": "Adapt this for KOREAN users"})),
            AgentRole::Adaptation
        );
        assert_eq!(classify_role(&json!({"content": "hello"})), AgentRole::Moderation);
    }

    #[test]
    fn test_classifier_defaults_to_scoring() {
        assert_eq!(classify_role(&json!({"q": "hello"})), AgentRole::Scoring);
        assert_eq!(classify_role(&serde_json::Value::Null), AgentRole::Scoring);
    }

    #[test]
    fn test_resolve_prefers_planned_role() {
        let sub = SubTask {
            id: "t-subtask-0".into(),
            parent_id: "t".into(),
            planned_role: Some(AgentRole::Adaptation),
            input: json!({"q": "find"}),
        };
        assert_eq!(resolve_role(&sub), AgentRole::Adaptation);
    }

    #[test]
    fn test_intrinsic_confidence_defaults_and_clamps() {
        assert_eq!(Opinion::new(json!({})).intrinsic_confidence(), 0.5);
        assert_eq!(
            Opinion::new(json!({"confidence": 0.88})).intrinsic_confidence(),
            0.88
        );
        assert_eq!(
            Opinion::new(json!({})).with_confidence(1.7).intrinsic_confidence(),
            1.0
        );
        assert_eq!(
            Opinion::new(json!({})).with_confidence(f64::NAN).intrinsic_confidence(),
            0.5
        );
    }

    struct Scripted;

    #[async_trait]
    impl CapabilityProvider for Scripted {
        async fn invoke(
            &self,
            role: AgentRole,
            _input: &serde_json::Value,
        ) -> SwarmResult<Opinion> {
            match role {
                AgentRole::Sourcing => Err(SwarmError::Provider("upstream down".into())),
                AgentRole::Moderation => panic!("moderation backend crashed"),
                AgentRole::Adaptation => {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(Opinion::new(json!({"adaptation": "late"})).with_confidence(0.9))
                }
                _ => Ok(Opinion::new(json!({"overallScore": 8})).with_confidence(0.8)),
            }
        }
    }

    fn planned(role: AgentRole, index: usize) -> SubTask {
        SubTask {
            id: SubTask::child_id("p", index),
            parent_id: "p".into(),
            planned_role: Some(role),
            input: json!({}),
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_subtask() {
        let registry = Arc::new(AgentRegistry::new());
        let dispatcher = Dispatcher::new(Arc::new(Scripted), registry.clone());
        let policy = DispatchPolicy {
            ceiling: Duration::from_secs(5),
            enforce_deadline: true,
        };
        let results = dispatcher
            .dispatch_all(
                vec![planned(AgentRole::Sourcing, 0), planned(AgentRole::Scoring, 1)],
                policy,
            )
            .await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].succeeded());
        assert_eq!(results[0].confidence, 0.0);
        assert!(results[1].succeeded());
        assert_eq!(results[1].confidence, 0.8);

        let sourcing = registry.get(AgentRole::Sourcing).await.unwrap();
        assert_eq!(sourcing.performance.error_rate, 1.0);
    }

    #[tokio::test]
    async fn test_provider_panic_is_isolated() {
        let registry = Arc::new(AgentRegistry::new());
        let dispatcher = Dispatcher::new(Arc::new(Scripted), registry.clone());
        let policy = DispatchPolicy {
            ceiling: Duration::from_secs(5),
            enforce_deadline: true,
        };
        let results = dispatcher
            .dispatch_all(
                vec![planned(AgentRole::Moderation, 0), planned(AgentRole::Scoring, 1)],
                policy,
            )
            .await;

        assert!(!results[0].succeeded());
        assert_eq!(results[0].confidence, 0.0);
        assert!(results[0].error.as_deref().unwrap().contains("aborted"));
        assert!(results[1].succeeded());

        let moderation = registry.get(AgentRole::Moderation).await.unwrap();
        assert_eq!(moderation.performance.error_rate, 1.0);
    }

    #[tokio::test]
    async fn test_enforced_deadline_cancels_call() {
        let registry = Arc::new(AgentRegistry::new());
        let dispatcher = Dispatcher::new(Arc::new(Scripted), registry.clone());
        let policy = DispatchPolicy {
            ceiling: Duration::from_millis(20),
            enforce_deadline: true,
        };
        let results = dispatcher
            .dispatch_all(vec![planned(AgentRole::Adaptation, 0)], policy)
            .await;
        assert!(results[0].timed_out);
        assert!(!results[0].succeeded());

        let agent = registry.get(AgentRole::Adaptation).await.unwrap();
        assert_eq!(agent.performance.soft_failures, 1);
    }

    #[tokio::test]
    async fn test_advisory_deadline_records_overrun() {
        let registry = Arc::new(AgentRegistry::new());
        let dispatcher = Dispatcher::new(Arc::new(Scripted), registry.clone());
        let policy = DispatchPolicy {
            ceiling: Duration::from_millis(20),
            enforce_deadline: false,
        };
        let results = dispatcher
            .dispatch_all(vec![planned(AgentRole::Adaptation, 0)], policy)
            .await;
        assert!(results[0].succeeded());
        assert!(results[0].overran);
        assert_eq!(results[0].opinion, Some(json!({"adaptation": "late"})));

        let agent = registry.get(AgentRole::Adaptation).await.unwrap();
        assert_eq!(agent.performance.soft_failures, 1);
        assert_eq!(agent.performance.successful_tasks, 1);
    }
}
