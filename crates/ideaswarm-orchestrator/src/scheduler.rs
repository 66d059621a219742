use chrono::{DateTime, Utc};
use cron::Schedule;
use ideaswarm_core::{SwarmError, SwarmResult};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Parse a cron expression string into a [`cron::Schedule`].
///
/// Uses the 7-field cron format: sec min hour day-of-month month day-of-week year.
pub fn parse_cron(cron_expr: &str) -> SwarmResult<Schedule> {
    Schedule::from_str(cron_expr)
        .map_err(|e| SwarmError::Config(format!("Invalid cron expression '{cron_expr}': {e}")))
}

/// First fire time of `cron_expr` after now.
pub fn next_fire_time(cron_expr: &str) -> SwarmResult<DateTime<Utc>> {
    let schedule = parse_cron(cron_expr)?;
    schedule.upcoming(Utc).next().ok_or_else(|| {
        SwarmError::Config(format!(
            "Cron expression '{cron_expr}' has no upcoming fire times"
        ))
    })
}

/// Background loops sharing one cancellation token.
pub struct BackgroundLoops {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundLoops {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every loop to exit and detach them.
    ///
    /// Does not wait: a tick already in progress (a drain batch, a discovery
    /// cycle) runs to completion in the background.
    pub fn cancel(self) {
        self.cancel.cancel();
        debug!(loops = self.handles.len(), "Background loops cancelled");
    }
}

impl Default for BackgroundLoops {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `tick` every `period` until cancelled or until `tick` returns `false`.
///
/// The first tick fires one full period after spawning. A tick already in
/// progress is allowed to finish when the token is cancelled; no tick starts
/// after that.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first interval tick completes immediately.
        interval.tick().await;
        info!(loop_name = name, period_ms = period.as_millis() as u64, "Loop started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if !tick().await {
                        break;
                    }
                }
            }
        }
        info!(loop_name = name, "Loop stopped");
    })
}

/// Run `job` at every fire time of `schedule` until cancelled or until `job`
/// returns `false`.
pub fn spawn_cron<F, Fut>(
    name: &'static str,
    schedule: Schedule,
    cancel: CancellationToken,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    tokio::spawn(async move {
        info!(loop_name = name, "Cron loop started");
        loop {
            let Some(next) = schedule.upcoming(Utc).next() else {
                warn!(loop_name = name, "Cron schedule has no upcoming fire times");
                break;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            debug!(loop_name = name, next = %next, "Sleeping until next fire time");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {
                    info!(loop_name = name, "Cron job firing");
                    if !job().await {
                        break;
                    }
                }
            }
        }
        info!(loop_name = name, "Cron loop stopped");
    })
}
