use crate::aggregator::{aggregate, Decision};
use crate::decomposer::decompose;
use crate::discovery::{CatalogSource, IdeaSource};
use crate::dispatch::{CapabilityProvider, DispatchPolicy, Dispatcher};
use crate::metrics::{compute, MetricsInput, OutcomeTally, PerformanceMetrics};
use crate::notifications::{NotificationQueue, NotificationSink};
use crate::registry::{AgentRegistry, RunOutcome};
use crate::router::ApprovalRouter;
use crate::scheduler::{next_fire_time, parse_cron, spawn_cron, spawn_periodic, BackgroundLoops};
use crate::task_queue::TaskQueue;
use crate::types::{Agent, AgentRole, SubTask, Task, TaskKind, TaskStatus};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use ideaswarm_core::{
    CommunityPost, ConfigPatch, DiscoveryReport, IdeaRecord, IdeaSubmission, MarketReport,
    Notification, NotificationCategory, Priority, ReviewStatus, SwarmConfig, SwarmError,
    SwarmResult, UserQuery,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Snapshot of the orchestrator's runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmStatus {
    pub is_running: bool,
    /// Tasks waiting in the queue.
    pub queue_length: usize,
    pub active_agents: usize,
    pub unread_notifications: usize,
    /// Recently finished tasks that still need a human decision.
    pub awaiting_review: usize,
    /// Next scheduled discovery cycle, when the cron loop is running.
    pub next_discovery: Option<DateTime<Utc>>,
}

/// The swarm orchestrator.
/// Implements the decompose → dispatch → aggregate → route pipeline.
///
/// One instance is shared behind an `Arc`; every operation takes `&self`.
/// Each task runs against the config snapshot taken when it started.
pub struct Orchestrator {
    config: parking_lot::RwLock<Arc<SwarmConfig>>,
    registry: Arc<AgentRegistry>,
    dispatcher: Dispatcher,
    discovery: Arc<dyn IdeaSource>,
    queue: Arc<RwLock<TaskQueue>>,
    notifications: Arc<NotificationQueue>,
    router: ApprovalRouter,
    metrics: RwLock<PerformanceMetrics>,
    tally: parking_lot::Mutex<OutcomeTally>,
    loops: parking_lot::Mutex<Option<BackgroundLoops>>,
    /// Cron expression driving the running discovery loop.
    discovery_schedule: parking_lot::Mutex<Option<String>>,
    draining: AtomicBool,
    alerting: AtomicBool,
}

impl Orchestrator {
    /// Create an orchestrator with the built-in discovery catalog.
    pub fn new(config: SwarmConfig, provider: Arc<dyn CapabilityProvider>) -> SwarmResult<Self> {
        config.validate()?;
        if let Some(expr) = &config.discovery_cron {
            parse_cron(expr)?;
        }
        let registry = Arc::new(AgentRegistry::new());
        let notifications = Arc::new(NotificationQueue::new(config.notification_capacity));
        let metrics = PerformanceMetrics {
            active_agents: AgentRole::ALL.len(),
            ..PerformanceMetrics::default()
        };

        Ok(Self {
            config: parking_lot::RwLock::new(Arc::new(config)),
            dispatcher: Dispatcher::new(provider, registry.clone()),
            registry,
            discovery: Arc::new(CatalogSource::default()),
            queue: Arc::new(RwLock::new(TaskQueue::new())),
            router: ApprovalRouter::new(notifications.clone()),
            notifications,
            metrics: RwLock::new(metrics),
            tally: parking_lot::Mutex::new(OutcomeTally::default()),
            loops: parking_lot::Mutex::new(None),
            discovery_schedule: parking_lot::Mutex::new(None),
            draining: AtomicBool::new(false),
            alerting: AtomicBool::new(false),
        })
    }

    /// Replace the discovery source.
    pub fn with_discovery(mut self, source: Arc<dyn IdeaSource>) -> Self {
        self.discovery = source;
        self
    }

    /// Forward every new notification to `sink`. Must be called inside a tokio
    /// runtime and before any notification is raised.
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        let capacity = self.config.read().notification_capacity;
        let notifications = Arc::new(NotificationQueue::new(capacity).with_sink(sink));
        self.router = ApprovalRouter::new(notifications.clone());
        self.notifications = notifications;
        self
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<SwarmConfig> {
        self.config.read().clone()
    }

    /// Get a reference to the agent registry.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    // --- Pipeline ---

    /// Run one task through the full pipeline and return it settled.
    ///
    /// Never fails: internal faults mark the task failed and raise an urgent
    /// notification. Tasks that are not pending are returned unchanged.
    pub async fn process_task(&self, task: Task) -> Task {
        self.execute(task).await.0
    }

    /// Returns the settled task, its decision and the config snapshot it ran
    /// against.
    async fn execute(&self, mut task: Task) -> (Task, Option<Decision>, Arc<SwarmConfig>) {
        let config = self.config();
        if task.status != TaskStatus::Pending {
            warn!(task_id = %task.id, status = %task.status, "Skipping task that is not pending");
            return (task, None, config);
        }

        let started = Instant::now();
        info!(
            task_id = %task.id,
            kind = %task.kind,
            priority = %task.priority,
            "Processing task"
        );

        let decision = match self.run_pipeline(&mut task, &config).await {
            Ok(decision) => Some(decision),
            Err(e) => {
                self.record_failure(&mut task, &e, &config);
                None
            }
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        self.registry
            .record(
                AgentRole::Master,
                RunOutcome {
                    success: task.status != TaskStatus::Failed,
                    confidence: task.confidence.unwrap_or(0.0),
                    latency_ms,
                    soft_failure: false,
                },
            )
            .await;
        self.tally.lock().record(task.status);
        self.queue.write().await.record_finished(task.clone());

        info!(
            task_id = %task.id,
            status = %task.status,
            confidence = task.confidence.unwrap_or(0.0),
            latency_ms,
            "Task settled"
        );
        (task, decision, config)
    }

    /// Decompose, dispatch, aggregate, route.
    async fn run_pipeline(&self, task: &mut Task, config: &SwarmConfig) -> SwarmResult<Decision> {
        task.advance(TaskStatus::Processing)?;
        task.assigned_agent = Some(AgentRole::Master);

        let mut subtasks = decompose(task);
        if subtasks.is_empty() {
            subtasks.push(SubTask::direct(task));
        }
        debug!(task_id = %task.id, subtasks = subtasks.len(), "Task decomposed");

        let results = self
            .dispatcher
            .dispatch_all(subtasks, DispatchPolicy::from_config(config))
            .await;

        let decision = aggregate(&results);
        if let Some(marker) = &decision.error {
            warn!(task_id = %task.id, error = %marker, "Decision carries an error marker");
        }
        task.confidence = Some(decision.confidence);
        task.output = Some(serde_json::to_value(&decision)?);

        self.router.route(task, decision.confidence, config)?;
        Ok(decision)
    }

    fn record_failure(&self, task: &mut Task, err: &SwarmError, config: &SwarmConfig) {
        error!(task_id = %task.id, error = %err, "Task processing failed");
        task.fail(err.to_string());
        self.notifications.push(
            Notification::new(
                NotificationCategory::SwarmError,
                "Swarm Processing Error",
                format!("Task {} failed: {err}", task.id),
                Priority::Urgent,
                config.notification_channels.clone(),
            )
            .with_task(task.id.clone())
            .with_details(serde_json::json!({ "kind": task.kind })),
        );
    }

    // --- Record-level operations ---

    /// Evaluate one idea and return its finalized record.
    pub async fn submit_idea(&self, submission: IdeaSubmission) -> IdeaRecord {
        let input = serde_json::to_value(&submission).unwrap_or_default();
        let task = Task::new(TaskKind::IdeaProcessing, input);
        let (task, decision, config) = self.execute(task).await;

        let mut record = IdeaRecord::from_submission(task.id.clone(), &submission);
        record.confidence_score = task.confidence;
        if let Some(decision) = &decision {
            record.adaptation = decision.adaptation.clone();
            record.feasibility_score = decision.overall_score;
        }
        record.status = approval_status(&task);
        record.review_note = review_note(&task, decision.as_ref(), &config);
        record.updated_at = Utc::now();
        record
    }

    /// Answer a free-text question through the single-intent path.
    pub async fn submit_query(&self, mut query: UserQuery) -> UserQuery {
        let input = serde_json::json!({
            "query": query.query,
            "context": query.context,
        });
        let task = Task::new(TaskKind::UserQuery, input);
        let started = Instant::now();
        let (task, decision, _) = self.execute(task).await;

        query.response = decision.and_then(|d| d.response).or(task.error);
        query.confidence = task.confidence;
        query.processing_time_ms = Some(started.elapsed().as_millis() as u64);
        query.responded_at = Some(Utc::now());
        query
    }

    /// Moderate a community post. It is approved only when the evaluators
    /// judged it appropriate and the task was auto-approved.
    pub async fn moderate_content(&self, mut post: CommunityPost) -> CommunityPost {
        let input = serde_json::to_value(&post).unwrap_or_default();
        let task = Task::new(TaskKind::ContentModeration, input).with_priority(Priority::High);
        let (task, decision, _) = self.execute(task).await;

        let appropriate = decision.as_ref().and_then(|d| d.appropriate) == Some(true);
        post.status = if appropriate && task.status == TaskStatus::Completed {
            ReviewStatus::Approved
        } else {
            ReviewStatus::Flagged
        };
        let now = Utc::now();
        post.moderated_by = Some(AgentRole::Moderation.to_string());
        post.moderated_at = Some(now);
        post.updated_at = now;
        post
    }

    /// Score the market potential of an idea.
    pub async fn analyze_market(&self, submission: IdeaSubmission) -> MarketReport {
        let input = serde_json::to_value(&submission).unwrap_or_default();
        let task = Task::new(TaskKind::MarketAnalysis, input);
        let (task, decision, _) = self.execute(task).await;

        let reasoning = decision
            .as_ref()
            .and_then(|d| d.reasoning.clone().or_else(|| d.error.clone()))
            .or_else(|| task.error.clone())
            .unwrap_or_default();
        MarketReport {
            title: IdeaRecord::from_submission(task.id.clone(), &submission).title,
            task_id: task.id.clone(),
            market_score: decision.as_ref().and_then(|d| d.overall_score),
            confidence: task.confidence.unwrap_or(0.0),
            status: approval_status(&task),
            reasoning,
            generated_at: Utc::now(),
        }
    }

    /// Evaluate several ideas concurrently. Output order matches input order.
    pub async fn batch_submit(&self, submissions: Vec<IdeaSubmission>) -> Vec<IdeaRecord> {
        info!(count = submissions.len(), "Batch submit");
        let pending: Vec<_> = submissions
            .into_iter()
            .map(|s| self.submit_idea(s))
            .collect();
        join_all(pending).await
    }

    /// Fetch fresh candidates from the discovery source and evaluate them.
    ///
    /// A discovery failure aborts the cycle and raises one error notification.
    pub async fn run_daily_discovery(&self) -> DiscoveryReport {
        let config = self.config();
        info!(count = config.discovery_count, "Running daily discovery");

        let ideas = match self.discovery.discover(config.discovery_count).await {
            Ok(ideas) => ideas,
            Err(e) => {
                error!(error = %e, "Daily discovery failed");
                self.notifications.push(Notification::new(
                    NotificationCategory::SwarmError,
                    "Daily Discovery Error",
                    format!("Error in daily idea discovery: {e}"),
                    Priority::High,
                    config.notification_channels.clone(),
                ));
                return DiscoveryReport {
                    error: Some(e.to_string()),
                    ..DiscoveryReport::default()
                };
            }
        };

        let discovered = ideas.len();
        let records = self.batch_submit(ideas).await;
        let approved = records
            .iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .count();
        let flagged = records
            .iter()
            .filter(|r| r.status == ReviewStatus::Flagged)
            .count();
        info!(discovered, approved, flagged, "Daily discovery complete");

        DiscoveryReport {
            discovered,
            approved,
            flagged,
            records,
            error: None,
        }
    }

    // --- Queue ---

    /// Queue a task for the background drain loop. Returns its id.
    pub async fn submit_task(
        &self,
        kind: TaskKind,
        priority: Priority,
        input: serde_json::Value,
    ) -> String {
        let task = Task::new(kind, input).with_priority(priority);
        let id = self.queue.write().await.add(task);
        debug!(task_id = %id, kind = %kind, priority = %priority, "Task queued");
        id
    }

    /// Look up a queued or recently finished task.
    pub async fn task(&self, id: &str) -> Option<Task> {
        self.queue.read().await.get(id).cloned()
    }

    /// Process up to `batch_size` queued tasks concurrently.
    ///
    /// Returns the number of tasks processed. A drain that starts while another
    /// is running does nothing.
    pub async fn drain_queue(&self) -> usize {
        if self.draining.swap(true, Ordering::AcqRel) {
            debug!("Drain already in progress, skipping");
            return 0;
        }
        let _guard = DrainGuard(&self.draining);

        let batch_size = self.config().batch_size;
        let batch = self.queue.write().await.drain_batch(batch_size);
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();
        info!(count, "Draining task queue");
        let pending: Vec<_> = batch.into_iter().map(|t| self.process_task(t)).collect();
        join_all(pending).await;
        count
    }

    // --- Metrics ---

    /// Recompute performance metrics and raise an alert when the error rate
    /// first rises above the configured limit.
    pub async fn refresh_metrics(&self) -> PerformanceMetrics {
        let master = self
            .registry
            .get(AgentRole::Master)
            .await
            .map(|a| a.performance)
            .unwrap_or_default();
        let workers = self.registry.aggregate().await;
        let active_agents = self.registry.active_count().await;
        let queue_length = self.queue.read().await.pending_count();
        let tally = *self.tally.lock();

        let metrics = compute(MetricsInput {
            master: &master,
            workers: &workers,
            tally,
            active_agents,
            queue_length,
        });
        *self.metrics.write().await = metrics.clone();

        let config = self.config();
        let elevated = workers.total_tasks > 0 && metrics.error_rate > config.alert_error_rate;
        let was_elevated = self.alerting.swap(elevated, Ordering::AcqRel);
        if elevated && !was_elevated {
            warn!(
                error_rate = metrics.error_rate,
                limit = config.alert_error_rate,
                "Error rate above limit"
            );
            self.notifications.push(
                Notification::new(
                    NotificationCategory::PerformanceAlert,
                    "Swarm Error Rate Elevated",
                    format!(
                        "Error rate {:.2} exceeds limit {:.2}",
                        metrics.error_rate, config.alert_error_rate
                    ),
                    Priority::High,
                    config.notification_channels.clone(),
                )
                .with_details(serde_json::to_value(&metrics).unwrap_or_default()),
            );
        }
        debug!(
            processed = metrics.total_tasks_processed,
            error_rate = metrics.error_rate,
            "Metrics refreshed"
        );
        metrics
    }

    pub async fn performance_metrics(&self) -> PerformanceMetrics {
        self.metrics.read().await.clone()
    }

    // --- Lifecycle ---

    /// Start the background loops. Returns `false` if already running.
    ///
    /// Loop periods and the discovery schedule are read from the current config;
    /// later config updates apply after a restart.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut slot = self.loops.lock();
        if slot.is_some() {
            debug!("Orchestrator already running");
            return false;
        }

        let config = self.config();
        let mut loops = BackgroundLoops::new();

        let weak = Arc::downgrade(self);
        loops.push(spawn_periodic(
            "queue_drain",
            Duration::from_millis(config.drain_interval_ms),
            loops.token(),
            move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(orchestrator) => {
                            orchestrator.drain_queue().await;
                            true
                        }
                        None => false,
                    }
                }
            },
        ));

        let weak = Arc::downgrade(self);
        loops.push(spawn_periodic(
            "metrics",
            Duration::from_millis(config.metrics_interval_ms),
            loops.token(),
            move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(orchestrator) => {
                            orchestrator.refresh_metrics().await;
                            true
                        }
                        None => false,
                    }
                }
            },
        ));

        if let Some(expr) = &config.discovery_cron {
            match parse_cron(expr) {
                Ok(schedule) => {
                    let weak = Arc::downgrade(self);
                    loops.push(spawn_cron(
                        "daily_discovery",
                        schedule,
                        loops.token(),
                        move || {
                            let weak = weak.clone();
                            async move {
                                match weak.upgrade() {
                                    Some(orchestrator) => {
                                        orchestrator.run_daily_discovery().await;
                                        true
                                    }
                                    None => false,
                                }
                            }
                        },
                    ));
                    *self.discovery_schedule.lock() = Some(expr.clone());
                }
                Err(e) => warn!(error = %e, "Discovery schedule disabled"),
            }
        }

        info!(loops = loops.len(), "Orchestrator started");
        *slot = Some(loops);
        true
    }

    /// Stop the background loops. Returns `false` if not running.
    ///
    /// Returns without waiting: a drain batch or discovery cycle already in
    /// progress finishes in the background, and no new cycle starts.
    pub fn stop(&self) -> bool {
        let loops = self.loops.lock().take();
        match loops {
            Some(loops) => {
                loops.cancel();
                *self.discovery_schedule.lock() = None;
                info!("Orchestrator stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.loops.lock().is_some()
    }

    // --- Status surface ---

    pub async fn status(&self) -> SwarmStatus {
        let (queue_length, awaiting_review) = {
            let queue = self.queue.read().await;
            (queue.pending_count(), queue.needs_review_count())
        };
        let schedule = self.discovery_schedule.lock().clone();
        let next_discovery = schedule.and_then(|expr| next_fire_time(&expr).ok());
        SwarmStatus {
            is_running: self.is_running(),
            queue_length,
            active_agents: self.registry.active_count().await,
            unread_notifications: self.notifications.unread().len(),
            awaiting_review,
            next_discovery,
        }
    }

    /// All retained notifications, unread first, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.list()
    }

    pub fn unread_notifications(&self) -> Vec<Notification> {
        self.notifications.unread()
    }

    /// Mark a notification read. Returns `true` only the first time.
    pub fn mark_notification_read(&self, id: &str) -> bool {
        self.notifications.mark_read(id)
    }

    pub async fn agents(&self) -> Vec<Agent> {
        self.registry.snapshot().await
    }

    /// Validate and merge a partial config update.
    ///
    /// In-flight tasks keep the snapshot they started with.
    pub fn update_config(&self, patch: ConfigPatch) -> SwarmResult<Arc<SwarmConfig>> {
        if patch.is_empty() {
            return Ok(self.config());
        }
        if let Some(expr) = patch.discovery_cron.as_deref() {
            if !expr.trim().is_empty() {
                parse_cron(expr)?;
            }
        }

        let next = {
            let mut current = self.config.write();
            let next = Arc::new(current.apply(&patch)?);
            *current = next.clone();
            next
        };
        self.notifications.set_capacity(next.notification_capacity);

        info!(
            auto_approval_threshold = next.auto_approval_threshold,
            batch_size = next.batch_size,
            "Configuration updated"
        );
        self.notifications.push(
            Notification::new(
                NotificationCategory::SystemUpdate,
                "Swarm Configuration Updated",
                "Configuration changes apply to tasks started from now on",
                Priority::Low,
                next.notification_channels.clone(),
            )
            .with_details(serde_json::to_value(&patch).unwrap_or_default()),
        );
        Ok(next)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(loops) = self.loops.get_mut().take() {
            loops.cancel();
        }
    }
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn approval_status(task: &Task) -> ReviewStatus {
    if task.status == TaskStatus::Completed {
        ReviewStatus::Approved
    } else {
        ReviewStatus::Flagged
    }
}

fn review_note(task: &Task, decision: Option<&Decision>, config: &SwarmConfig) -> Option<String> {
    match task.status {
        TaskStatus::Completed => None,
        TaskStatus::NeedsReview => {
            let mut note = format!(
                "confidence {:.2} below {:.2}",
                task.confidence.unwrap_or(0.0),
                config.auto_approval_threshold
            );
            if let Some(marker) = decision.and_then(|d| d.error.as_deref()) {
                note.push_str(&format!(" ({marker})"));
            }
            Some(note)
        }
        _ => Some(
            task.error
                .clone()
                .unwrap_or_else(|| format!("task ended {}", task.status)),
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::providers::RuleProvider;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(SwarmConfig::default(), Arc::new(RuleProvider::new())).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SwarmConfig {
            batch_size: 0,
            ..SwarmConfig::default()
        };
        assert!(Orchestrator::new(config, Arc::new(RuleProvider::new())).is_err());

        let config = SwarmConfig {
            discovery_cron: Some("every day".into()),
            ..SwarmConfig::default()
        };
        assert!(Orchestrator::new(config, Arc::new(RuleProvider::new())).is_err());
    }

    #[test]
    fn test_record_failure_marks_task_and_notifies() {
        let orch = orchestrator();
        let mut task = Task::new(TaskKind::IdeaProcessing, serde_json::json!({}));
        task.advance(TaskStatus::Processing).unwrap();

        let config = orch.config();
        orch.record_failure(
            &mut task,
            &SwarmError::Orchestrator("boom".into()),
            &config,
        );
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.as_deref().unwrap().contains("boom"));

        let notes = orch.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].category, NotificationCategory::SwarmError);
        assert_eq!(notes[0].priority, Priority::Urgent);
        assert_eq!(notes[0].task_id.as_deref(), Some(task.id.as_str()));
    }

    #[tokio::test]
    async fn test_non_pending_task_returned_unchanged() {
        let orch = orchestrator();
        let mut task = Task::new(TaskKind::IdeaProcessing, serde_json::json!({}));
        task.advance(TaskStatus::Processing).unwrap();
        let returned = orch.process_task(task.clone()).await;
        assert_eq!(returned.status, TaskStatus::Processing);
        assert!(returned.output.is_none());
        assert!(orch.task(&task.id).await.is_none());
    }

    #[tokio::test]
    async fn test_user_query_uses_direct_subtask() {
        let orch = orchestrator();
        let query = orch
            .submit_query(UserQuery::new("user-1", "How big is the pet market?"))
            .await;
        // "market" routes to scoring.
        assert!(query.response.as_deref().unwrap().starts_with("Market assessment"));
        assert!(query.confidence.is_some());
        assert!(query.responded_at.is_some());

        let scoring = orch.registry().get(AgentRole::Scoring).await.unwrap();
        assert_eq!(scoring.performance.total_tasks, 1);
    }

    #[test]
    fn test_review_note_variants() {
        let config = SwarmConfig::default();
        let mut task = Task::new(TaskKind::IdeaProcessing, serde_json::json!({}));
        task.advance(TaskStatus::Processing).unwrap();
        task.confidence = Some(0.5);
        task.advance(TaskStatus::NeedsReview).unwrap();
        assert_eq!(
            review_note(&task, None, &config).as_deref(),
            Some("confidence 0.50 below 0.90")
        );

        let decision = Decision::failed("bad field");
        assert_eq!(
            review_note(&task, Some(&decision), &config).as_deref(),
            Some("confidence 0.50 below 0.90 (bad field)")
        );
    }

    #[test]
    fn test_update_config_validates_and_notifies() {
        let orch = orchestrator();
        let bad = ConfigPatch {
            auto_approval_threshold: Some(1.5),
            ..ConfigPatch::default()
        };
        assert!(orch.update_config(bad).is_err());
        assert!(orch.notifications().is_empty());

        let bad_cron = ConfigPatch {
            discovery_cron: Some("whenever".into()),
            ..ConfigPatch::default()
        };
        assert!(orch.update_config(bad_cron).is_err());

        let patch = ConfigPatch {
            auto_approval_threshold: Some(0.8),
            ..ConfigPatch::default()
        };
        let next = orch.update_config(patch).unwrap();
        assert_eq!(next.auto_approval_threshold, 0.8);
        assert_eq!(orch.config().auto_approval_threshold, 0.8);
        let notes = orch.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].category, NotificationCategory::SystemUpdate);
        assert_eq!(notes[0].priority, Priority::Low);

        orch.update_config(ConfigPatch::default()).unwrap();
        assert_eq!(orch.notifications().len(), 1);
    }
}
