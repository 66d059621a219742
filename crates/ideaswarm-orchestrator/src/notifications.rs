use async_trait::async_trait;
use ideaswarm_core::Notification;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outbound delivery for notifications (email relay, chat webhook, ...).
///
/// Delivery is best-effort and at-most-once; failures are logged and dropped.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> ideaswarm_core::SwarmResult<()>;
}

/// Bounded, read-state-aware notification store.
///
/// Pushing never blocks on I/O: when a sink is attached, new notifications are
/// handed to a background task through an unbounded channel.
pub struct NotificationQueue {
    entries: Mutex<VecDeque<Notification>>,
    capacity: Mutex<usize>,
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: Mutex::new(capacity.max(1)),
            tx: None,
        }
    }

    /// Attach a sink. Spawns the forwarding task, so this must run inside a tokio runtime.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if let Err(e) = sink.deliver(&notification).await {
                    warn!(
                        notification_id = %notification.id,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        });

        self.tx = Some(tx);
        self
    }

    /// Store a notification, evicting the oldest read entry (or, failing that,
    /// the oldest unread one) when at capacity.
    pub fn push(&self, notification: Notification) {
        debug!(
            notification_id = %notification.id,
            category = %notification.category,
            priority = %notification.priority,
            "Notification queued"
        );
        if let Some(tx) = &self.tx {
            let _ = tx.send(notification.clone());
        }

        let capacity = *self.capacity.lock();
        let mut entries = self.entries.lock();
        while entries.len() >= capacity {
            evict_one(&mut entries);
        }
        entries.push_back(notification);
    }

    /// Change the retention bound. Excess entries are evicted immediately.
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = capacity.max(1);
        *self.capacity.lock() = capacity;
        let mut entries = self.entries.lock();
        while entries.len() > capacity {
            evict_one(&mut entries);
        }
    }

    /// All retained notifications, unread first, newest first within each group.
    pub fn list(&self) -> Vec<Notification> {
        let entries = self.entries.lock();
        let mut list: Vec<Notification> = entries.iter().rev().cloned().collect();
        // Stable sort keeps newest-first within each group.
        list.sort_by_key(|n| n.is_read);
        list
    }

    pub fn unread(&self) -> Vec<Notification> {
        let entries = self.entries.lock();
        entries.iter().rev().filter(|n| !n.is_read).cloned().collect()
    }

    /// Mark a notification read. Returns `true` only on the first call for a
    /// retained id.
    pub fn mark_read(&self, id: &str) -> bool {
        let mut entries = self.entries.lock();
        entries
            .iter_mut()
            .find(|n| n.id == id)
            .is_some_and(Notification::mark_read)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn evict_one(entries: &mut VecDeque<Notification>) {
    if let Some(pos) = entries.iter().position(|n| n.is_read) {
        entries.remove(pos);
    } else if let Some(dropped) = entries.pop_front() {
        warn!(
            notification_id = %dropped.id,
            category = %dropped.category,
            "Notification queue full, dropping oldest unread notification"
        );
    }
}
