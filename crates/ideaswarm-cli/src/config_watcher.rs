//! Config hot-reload watcher.
//!
//! Watches an `ideaswarm.toml` file for modifications and invokes a callback
//! with the freshly parsed [`ConfigPatch`] after a debounce window.

use ideaswarm_core::{ConfigPatch, SwarmError, SwarmResult};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

/// Watches a config file on disk and calls back on every (debounced) change.
///
/// Dropping the watcher releases the file-system watch, which in turn ends
/// the background reload thread.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Start watching `config_path` for modifications.
    ///
    /// * `debounce_ms` -- minimum milliseconds between two reload callbacks.
    /// * `on_reload` -- called on a background thread with every patch that
    ///   parses. Parse errors are logged and skipped.
    pub fn start<F>(config_path: PathBuf, debounce_ms: u64, on_reload: F) -> SwarmResult<Self>
    where
        F: Fn(ConfigPatch) + Send + 'static,
    {
        let (tx, rx) = std_mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    let _ = tx.send(());
                }
            }
        })
        .map_err(|e| SwarmError::Config(format!("Failed to create file watcher: {e}")))?;

        watcher
            .watch(config_path.as_ref(), RecursiveMode::NonRecursive)
            .map_err(|e| SwarmError::Config(format!("Failed to watch config file: {e}")))?;

        let path = config_path.clone();
        std::thread::spawn(move || {
            let debounce = Duration::from_millis(debounce_ms);
            let mut last_reload = Instant::now();

            while rx.recv().is_ok() {
                // Editors often write in several bursts.
                while rx.try_recv().is_ok() {}

                let elapsed = last_reload.elapsed();
                if elapsed < debounce {
                    std::thread::sleep(debounce - elapsed);
                }
                last_reload = Instant::now();

                match parse_patch(&path) {
                    Ok(patch) if patch.is_empty() => {
                        tracing::debug!(path = %path.display(), "Config file has no settings");
                    }
                    Ok(patch) => on_reload(patch),
                    Err(e) => tracing::warn!(error = %e, "Failed to reload config"),
                }
            }

            tracing::debug!("Config watcher thread exiting");
        });

        tracing::info!(path = %config_path.display(), "Config hot-reload watcher started");

        Ok(Self { _watcher: watcher })
    }
}

/// Read a TOML config file as a partial update.
pub fn parse_patch(path: &Path) -> SwarmResult<ConfigPatch> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SwarmError::Config(format!("Failed to read config '{}': {e}", path.display()))
    })?;
    ConfigPatch::from_toml_str(&content).map_err(|e| {
        SwarmError::Config(format!("Failed to parse config '{}': {e}", path.display()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_partial_config() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp.as_file_mut(),
            r#"
auto_approval_threshold = 0.8
notification_capacity = 50

[features]
enforce_deadline = true
"#
        )
        .unwrap();

        let patch = parse_patch(tmp.path()).unwrap();
        assert_eq!(patch.auto_approval_threshold, Some(0.8));
        assert_eq!(patch.notification_capacity, Some(50));
        assert!(patch.features.unwrap().enforce_deadline);
        // Not specified in the file.
        assert!(patch.batch_size.is_none());
        assert!(patch.discovery_cron.is_none());
    }

    #[test]
    fn test_parse_empty_config_is_empty_patch() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp.as_file_mut()).unwrap();

        let patch = parse_patch(tmp.path()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_parse_invalid_toml_returns_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp.as_file_mut(), "{{{{invalid toml!!!!").unwrap();
        let err_msg = parse_patch(tmp.path()).unwrap_err().to_string();
        assert!(
            err_msg.contains("Failed to parse config"),
            "unexpected error: {err_msg}"
        );
    }

    #[test]
    fn test_parse_nonexistent_file_returns_error() {
        let err_msg = parse_patch(Path::new("/nonexistent/path/ideaswarm.toml"))
            .unwrap_err()
            .to_string();
        assert!(
            err_msg.contains("Failed to read config"),
            "unexpected error: {err_msg}"
        );
    }

    #[test]
    fn test_watcher_starts_on_existing_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let watcher = ConfigWatcher::start(tmp.path().to_path_buf(), 50, |_| {});
        assert!(watcher.is_ok());
    }
}
