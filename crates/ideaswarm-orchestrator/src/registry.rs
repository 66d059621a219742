use crate::types::{Agent, AgentPerformance, AgentRole};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of one unit of work, fed into an agent's counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    pub success: bool,
    pub confidence: f64,
    pub latency_ms: u64,
    /// Deadline expiry or overrun.
    pub soft_failure: bool,
}

/// Holds metadata and performance counters for the five swarm roles.
///
/// The set of agents is fixed at construction; only counters change afterwards.
/// All counter updates go through the write lock, so concurrently settling
/// sub-tasks never lose updates.
pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<AgentRole, Agent>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        let agents = AgentRole::ALL
            .iter()
            .map(|role| (*role, agent_definition(*role)))
            .collect();
        Self {
            agents: Arc::new(RwLock::new(agents)),
        }
    }

    /// Fold one outcome into the counters of `role`.
    pub async fn record(&self, role: AgentRole, outcome: RunOutcome) {
        let mut agents = self.agents.write().await;
        if let Some(agent) = agents.get_mut(&role) {
            let perf = &mut agent.performance;
            perf.total_tasks += 1;
            if outcome.success {
                perf.successful_tasks += 1;
            }
            if outcome.soft_failure {
                perf.soft_failures += 1;
            }
            let n = perf.total_tasks as f64;
            perf.average_confidence += (outcome.confidence - perf.average_confidence) / n;
            perf.average_latency_ms += (outcome.latency_ms as f64 - perf.average_latency_ms) / n;
            perf.error_rate = (perf.total_tasks - perf.successful_tasks) as f64 / n;
            agent.last_active = Utc::now();
        }
    }

    /// Snapshot of all agents in role order.
    pub async fn snapshot(&self) -> Vec<Agent> {
        let agents = self.agents.read().await;
        let mut list: Vec<Agent> = agents.values().cloned().collect();
        list.sort_by_key(|a| a.role);
        list
    }

    pub async fn get(&self, role: AgentRole) -> Option<Agent> {
        let agents = self.agents.read().await;
        agents.get(&role).cloned()
    }

    pub async fn active_count(&self) -> usize {
        let agents = self.agents.read().await;
        agents.values().filter(|a| a.is_active).count()
    }

    /// Counters summed across the worker roles (every role but master).
    pub async fn aggregate(&self) -> AgentPerformance {
        let agents = self.agents.read().await;
        let mut total = AgentPerformance::default();
        let mut weighted_conf = 0.0;
        let mut weighted_latency = 0.0;
        for agent in agents.values().filter(|a| a.role != AgentRole::Master) {
            let perf = &agent.performance;
            total.total_tasks += perf.total_tasks;
            total.successful_tasks += perf.successful_tasks;
            total.soft_failures += perf.soft_failures;
            weighted_conf += perf.average_confidence * perf.total_tasks as f64;
            weighted_latency += perf.average_latency_ms * perf.total_tasks as f64;
        }
        if total.total_tasks > 0 {
            let n = total.total_tasks as f64;
            total.average_confidence = weighted_conf / n;
            total.average_latency_ms = weighted_latency / n;
            total.error_rate = (total.total_tasks - total.successful_tasks) as f64 / n;
        }
        total
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn agent_definition(role: AgentRole) -> Agent {
    let (name, description, capabilities): (&str, &str, &[&str]) = match role {
        AgentRole::Master => (
            "Master Agent",
            "Orchestrates task decomposition and coordination",
            &["task_decomposition", "coordination", "workflow_management"],
        ),
        AgentRole::Sourcing => (
            "Sourcing Agent",
            "Discovers ideas and checks their provenance",
            &["web_scraping", "api_integration", "content_extraction"],
        ),
        AgentRole::Scoring => (
            "Scoring Agent",
            "Evaluates local feasibility and market fit",
            &["market_analysis", "cultural_assessment", "regulatory_compliance"],
        ),
        AgentRole::Adaptation => (
            "Adaptation Agent",
            "Generates localized market adaptations",
            &["localization", "cultural_modification", "integration_suggestions"],
        ),
        AgentRole::Moderation => (
            "Moderation Agent",
            "Handles community content and spam filtering",
            &["content_moderation", "spam_detection", "quality_assessment"],
        ),
    };
    Agent {
        id: role.to_string(),
        role,
        name: name.to_string(),
        description: description.to_string(),
        capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
        is_active: true,
        last_active: Utc::now(),
        performance: AgentPerformance::default(),
    }
}
