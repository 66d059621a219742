use crate::types::{AgentPerformance, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Swarm-wide performance figures, refreshed periodically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Settled tasks of every kind.
    pub total_tasks_processed: u64,
    /// Share of processed tasks approved without review.
    pub auto_approval_rate: f64,
    pub average_confidence: f64,
    pub average_processing_time_ms: f64,
    /// Share of capability calls that failed.
    pub error_rate: f64,
    /// Deadline expiries and overruns across all worker roles.
    pub soft_failures: u64,
    pub active_agents: usize,
    pub queue_length: usize,
    pub last_updated: DateTime<Utc>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            total_tasks_processed: 0,
            auto_approval_rate: 0.0,
            average_confidence: 0.0,
            average_processing_time_ms: 0.0,
            error_rate: 0.0,
            soft_failures: 0,
            active_agents: 0,
            queue_length: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Settled-task outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub processed: u64,
    pub approved: u64,
    pub flagged: u64,
    pub failed: u64,
}

impl OutcomeTally {
    /// Count one settled task. Unsettled statuses are ignored.
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Completed => self.approved += 1,
            TaskStatus::NeedsReview => self.flagged += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Pending | TaskStatus::Processing => return,
        }
        self.processed += 1;
    }
}

/// Inputs for one metrics refresh.
pub struct MetricsInput<'a> {
    /// Counters of the master role (one entry per processed task).
    pub master: &'a AgentPerformance,
    /// Counters summed over the worker roles.
    pub workers: &'a AgentPerformance,
    pub tally: OutcomeTally,
    pub active_agents: usize,
    pub queue_length: usize,
}

pub fn compute(input: MetricsInput<'_>) -> PerformanceMetrics {
    let processed = input.tally.processed;
    let ratio = |count: u64| {
        if processed == 0 {
            0.0
        } else {
            count as f64 / processed as f64
        }
    };
    PerformanceMetrics {
        total_tasks_processed: processed,
        auto_approval_rate: ratio(input.tally.approved),
        average_confidence: input.master.average_confidence,
        average_processing_time_ms: input.master.average_latency_ms,
        error_rate: input.workers.error_rate,
        soft_failures: input.workers.soft_failures,
        active_agents: input.active_agents,
        queue_length: input.queue_length,
        last_updated: Utc::now(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_ignores_unsettled() {
        let mut tally = OutcomeTally::default();
        tally.record(TaskStatus::Pending);
        tally.record(TaskStatus::Processing);
        assert_eq!(tally.processed, 0);

        tally.record(TaskStatus::Completed);
        tally.record(TaskStatus::NeedsReview);
        tally.record(TaskStatus::Failed);
        assert_eq!(tally.processed, 3);
        assert_eq!((tally.approved, tally.flagged, tally.failed), (1, 1, 1));
    }

    #[test]
    fn test_compute_rates() {
        let master = AgentPerformance {
            total_tasks: 4,
            successful_tasks: 3,
            average_confidence: 0.8,
            average_latency_ms: 120.0,
            error_rate: 0.25,
            soft_failures: 0,
        };
        let workers = AgentPerformance {
            total_tasks: 12,
            error_rate: 0.25,
            soft_failures: 2,
            ..AgentPerformance::default()
        };
        let tally = OutcomeTally {
            processed: 4,
            approved: 2,
            flagged: 1,
            failed: 1,
        };
        let metrics = compute(MetricsInput {
            master: &master,
            workers: &workers,
            tally,
            active_agents: 5,
            queue_length: 3,
        });
        assert_eq!(metrics.total_tasks_processed, 4);
        assert_eq!(metrics.auto_approval_rate, 0.5);
        assert_eq!(metrics.error_rate, 0.25);
        assert_eq!(metrics.soft_failures, 2);
        assert_eq!(metrics.average_confidence, 0.8);
        assert_eq!(metrics.queue_length, 3);
    }

    #[test]
    fn test_compute_with_no_history() {
        let perf = AgentPerformance::default();
        let metrics = compute(MetricsInput {
            master: &perf,
            workers: &perf,
            tally: OutcomeTally::default(),
            active_agents: 5,
            queue_length: 0,
        });
        assert_eq!(metrics.auto_approval_rate, 0.0);
        assert_eq!(metrics.error_rate, 0.0);
        assert_eq!(metrics.active_agents, 5);
    }
}
