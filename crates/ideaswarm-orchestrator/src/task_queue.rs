use crate::types::{Task, TaskStatus};
use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};

/// Number of finished tasks kept for lookup by default.
pub const DEFAULT_HISTORY: usize = 256;

/// Pending composite tasks waiting for a drain cycle, plus a bounded history
/// of finished ones.
///
/// Drain order is priority (urgent first), then insertion order.
pub struct TaskQueue {
    pending: HashMap<String, (u64, Task)>,
    next_seq: u64,
    finished: VecDeque<Task>,
    history_limit: usize,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    pub fn with_history(history_limit: usize) -> Self {
        Self {
            pending: HashMap::new(),
            next_seq: 0,
            finished: VecDeque::new(),
            history_limit: history_limit.max(1),
        }
    }

    /// Add a pending task. Returns its id.
    pub fn add(&mut self, task: Task) -> String {
        let id = task.id.clone();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(id.clone(), (seq, task));
        id
    }

    /// Pending tasks in drain order.
    pub fn all_pending(&self) -> Vec<&Task> {
        let mut ready: Vec<&(u64, Task)> = self.pending.values().collect();
        ready.sort_by_key(|(seq, t)| (Reverse(t.priority), *seq));
        ready.into_iter().map(|(_, t)| t).collect()
    }

    /// Remove and return up to `max` tasks in drain order.
    pub fn drain_batch(&mut self, max: usize) -> Vec<Task> {
        let ids: Vec<String> = self
            .all_pending()
            .into_iter()
            .take(max)
            .map(|t| t.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.pending.remove(id))
            .map(|(_, task)| task)
            .collect()
    }

    /// Keep a settled task for later lookup, dropping the oldest beyond the limit.
    pub fn record_finished(&mut self, task: Task) {
        self.finished.push_back(task);
        while self.finished.len() > self.history_limit {
            self.finished.pop_front();
        }
    }

    /// Look a task up among pending and recently finished tasks.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.pending
            .get(id)
            .map(|(_, t)| t)
            .or_else(|| self.finished.iter().rev().find(|t| t.id == id))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    /// Count of retained tasks awaiting human review.
    pub fn needs_review_count(&self) -> usize {
        self.finished
            .iter()
            .filter(|t| t.status == TaskStatus::NeedsReview)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::TaskKind;
    use ideaswarm_core::Priority;

    fn task(priority: Priority) -> Task {
        Task::new(TaskKind::IdeaProcessing, serde_json::json!({})).with_priority(priority)
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.pending_count(), 0);
        assert!(queue.is_empty());
        assert!(queue.drain_batch(10).is_empty());
    }

    #[test]
    fn test_add_and_retrieve() {
        let mut queue = TaskQueue::new();
        let id = queue.add(task(Priority::Medium));
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.get(&id).unwrap().status, TaskStatus::Pending);
        assert!(queue.get("idea-missing").is_none());
    }

    #[test]
    fn test_drain_order_priority_then_fifo() {
        let mut queue = TaskQueue::new();
        let low = queue.add(task(Priority::Low));
        let med_a = queue.add(task(Priority::Medium));
        let urgent = queue.add(task(Priority::Urgent));
        let med_b = queue.add(task(Priority::Medium));

        let order: Vec<String> = queue.drain_batch(10).into_iter().map(|t| t.id).collect();
        assert_eq!(order, vec![urgent, med_a, med_b, low]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_respects_batch_size() {
        let mut queue = TaskQueue::new();
        for _ in 0..5 {
            queue.add(task(Priority::Medium));
        }
        assert_eq!(queue.drain_batch(2).len(), 2);
        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.drain_batch(0).len(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut queue = TaskQueue::with_history(2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut t = task(Priority::Medium);
            t.advance(TaskStatus::Processing).unwrap();
            t.advance(TaskStatus::NeedsReview).unwrap();
            ids.push(t.id.clone());
            queue.record_finished(t);
        }
        assert_eq!(queue.finished_count(), 2);
        assert!(queue.get(&ids[0]).is_none());
        assert_eq!(queue.get(&ids[2]).unwrap().status, TaskStatus::NeedsReview);
        assert_eq!(queue.needs_review_count(), 2);
    }
}
