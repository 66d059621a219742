use chrono::{DateTime, Utc};
use ideaswarm_core::{Priority, SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of each agent in the swarm. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Decomposes tasks, dispatches sub-tasks, aggregates results.
    Master,
    /// Checks provenance and discovers candidate ideas.
    Sourcing,
    /// Evaluates feasibility and market fit.
    Scoring,
    /// Produces localized adaptations.
    Adaptation,
    /// Reviews community content.
    Moderation,
}

impl AgentRole {
    /// All roles, in registry order.
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Master,
        AgentRole::Sourcing,
        AgentRole::Scoring,
        AgentRole::Adaptation,
        AgentRole::Moderation,
    ];
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Master => write!(f, "master"),
            AgentRole::Sourcing => write!(f, "sourcing"),
            AgentRole::Scoring => write!(f, "scoring"),
            AgentRole::Adaptation => write!(f, "adaptation"),
            AgentRole::Moderation => write!(f, "moderation"),
        }
    }
}

/// Kind of composite task accepted by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    IdeaProcessing,
    UserQuery,
    ContentModeration,
    MarketAnalysis,
}

impl TaskKind {
    fn id_prefix(self) -> &'static str {
        match self {
            TaskKind::IdeaProcessing => "idea",
            TaskKind::UserQuery => "query",
            TaskKind::ContentModeration => "moderation",
            TaskKind::MarketAnalysis => "market",
        }
    }

    /// Human-readable name of what the task evaluates.
    pub fn subject(self) -> &'static str {
        match self {
            TaskKind::IdeaProcessing => "Idea",
            TaskKind::UserQuery => "Query",
            TaskKind::ContentModeration => "Post",
            TaskKind::MarketAnalysis => "Market Analysis",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::IdeaProcessing => write!(f, "idea_processing"),
            TaskKind::UserQuery => write!(f, "user_query"),
            TaskKind::ContentModeration => write!(f, "content_moderation"),
            TaskKind::MarketAnalysis => write!(f, "market_analysis"),
        }
    }
}

/// Status of a task. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    /// Confidence fell below the auto-approval threshold; awaiting a human.
    NeedsReview,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether `self -> next` is a legal forward transition.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::NeedsReview)
                | (TaskStatus::Processing, TaskStatus::Failed)
                | (TaskStatus::NeedsReview, TaskStatus::Completed)
        )
    }

    /// Whether the orchestrator is done with the task.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::NeedsReview | TaskStatus::Failed
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::NeedsReview => write!(f, "needs_review"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A unit of orchestrated work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub priority: Priority,
    pub input: serde_json::Value,
    pub output: Option<serde_json::Value>,
    /// Aggregate confidence in [0, 1], once computed.
    pub confidence: Option<f64>,
    pub assigned_agent: Option<AgentRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Task {
    pub fn new(kind: TaskKind, input: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-{}", kind.id_prefix(), Uuid::new_v4().simple()),
            kind,
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            input,
            output: None,
            confidence: None,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            error: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Move the task forward. Regressions and skips are rejected.
    pub fn advance(&mut self, next: TaskStatus) -> SwarmResult<()> {
        if !self.status.can_advance_to(next) {
            return Err(SwarmError::Orchestrator(format!(
                "Task {}: illegal transition {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        if next.is_settled() {
            self.completed_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Record an unhandled fault. Only a processing task becomes `Failed`;
    /// otherwise the error is attached without touching the status.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        if self.status == TaskStatus::Processing {
            self.status = TaskStatus::Failed;
            self.completed_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
    }
}

/// A decomposed unit of work dispatched to one capability role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub parent_id: String,
    /// Role chosen by the decomposer. `None` means the keyword classifier decides.
    pub planned_role: Option<AgentRole>,
    pub input: serde_json::Value,
}

impl SubTask {
    /// Deterministic sub-task id for the `index`-th child of `parent_id`.
    pub fn child_id(parent_id: &str, index: usize) -> String {
        format!("{parent_id}-subtask-{index}")
    }

    /// Single sub-task carrying the whole parent input, routed by classification.
    pub fn direct(parent: &Task) -> Self {
        Self {
            id: Self::child_id(&parent.id, 0),
            parent_id: parent.id.clone(),
            planned_role: None,
            input: parent.input.clone(),
        }
    }
}

/// The settled outcome of one sub-task. Failures are carried, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskResult {
    pub subtask_id: String,
    pub role: AgentRole,
    pub opinion: Option<serde_json::Value>,
    /// Intrinsic confidence reported by the provider (0 for failures).
    pub confidence: f64,
    pub error: Option<String>,
    pub latency_ms: u64,
    /// Cancelled at the processing-time ceiling.
    #[serde(default)]
    pub timed_out: bool,
    /// Completed, but after the processing-time ceiling.
    #[serde(default)]
    pub overran: bool,
}

impl SubTaskResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn failure(
        subtask_id: impl Into<String>,
        role: AgentRole,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            subtask_id: subtask_id.into(),
            role,
            opinion: None,
            confidence: 0.0,
            error: Some(error.into()),
            latency_ms,
            timed_out: false,
            overran: false,
        }
    }
}

/// Performance counters kept per agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub average_confidence: f64,
    pub average_latency_ms: f64,
    pub error_rate: f64,
    /// Deadline expiries and overruns.
    pub soft_failures: u64,
}

/// Registry entry for one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub role: AgentRole,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub is_active: bool,
    pub last_active: DateTime<Utc>,
    pub performance: AgentPerformance,
}
