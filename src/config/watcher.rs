//! Configuration file watcher for target list hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::{load_config, ConfigError};
use crate::health::SharedTargetSource;

/// Watches the configuration file and pushes target list changes into a source.
///
/// Only the target list is reloaded; thresholds and intervals are fixed
/// for the lifetime of the engine.
pub struct ConfigWatcher {
    path: PathBuf,
    source: Arc<SharedTargetSource>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, source: Arc<SharedTargetSource>) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let source = Arc::clone(&self.source);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading targets...");
                        if let Err(e) = reload_targets(&path, &source) {
                            tracing::error!("Failed to reload config: {}. Keeping current targets.", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read the file and replace the source's targets.
///
/// Returns whether the target list changed.
pub fn reload_targets(path: &Path, source: &SharedTargetSource) -> Result<bool, ConfigError> {
    let config = load_config(path)?;
    let changed = source.replace(config.target_list());
    if changed {
        tracing::info!(targets = config.targets.len(), "Target list reloaded, refresh requested");
    }
    Ok(changed)
}
