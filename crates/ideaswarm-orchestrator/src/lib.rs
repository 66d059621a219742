//! Swarm orchestration engine for idea evaluation.
//!
//! Composite tasks are decomposed into role-specific sub-tasks, dispatched
//! concurrently to a black-box [`CapabilityProvider`], merged into a single
//! decision with an aggregate confidence, and then either auto-approved or
//! escalated for human review.
//!
//! # Main types
//!
//! - [`Orchestrator`]: Shared context object exposing every swarm operation.
//! - [`CapabilityProvider`]: Backend trait that produces role-specific opinions.
//! - [`AgentRegistry`]: Metadata and performance counters for the five roles.
//! - [`NotificationQueue`]: Bounded store of escalations and error events.
//! - [`IdeaSource`]: Supplier of candidates for the discovery cycle.
//! - [`RuleProvider`]: Deterministic built-in provider.

/// Merges sub-task results into a decision.
pub mod aggregator;
/// Splits composite tasks into role-specific sub-tasks.
pub mod decomposer;
/// Candidate idea sources.
pub mod discovery;
/// Capability provider trait, role classification and concurrent dispatch.
pub mod dispatch;
/// The orchestrator context object.
pub mod engine;
/// Swarm-wide performance metrics.
pub mod metrics;
/// Bounded notification store and delivery sinks.
pub mod notifications;
/// Built-in rule-based capability provider.
pub mod providers;
/// Agent metadata and performance counters.
pub mod registry;
/// Confidence-based approval routing.
pub mod router;
/// Cancellable periodic and cron-driven loops.
pub mod scheduler;
/// Pending-task queue with finished-task history.
pub mod task_queue;
/// Shared orchestration types (Task, SubTask, Agent, etc.).
pub mod types;

pub use aggregator::{aggregate, Decision};
pub use decomposer::decompose;
pub use discovery::{CatalogSource, IdeaSource};
pub use dispatch::{classify_role, CapabilityProvider, DispatchPolicy, Dispatcher, Opinion};
pub use engine::{Orchestrator, SwarmStatus};
pub use metrics::{OutcomeTally, PerformanceMetrics};
pub use notifications::{NotificationQueue, NotificationSink};
pub use providers::RuleProvider;
pub use registry::{AgentRegistry, RunOutcome};
pub use router::{ApprovalRouter, ReviewLane, Route};
pub use scheduler::BackgroundLoops;
pub use task_queue::TaskQueue;
pub use types::{
    Agent, AgentPerformance, AgentRole, SubTask, SubTaskResult, Task, TaskKind, TaskStatus,
};
