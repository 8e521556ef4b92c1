//! Configuration file watcher for hot reload.
//!
//! The provider list may change while the daemon runs. Editors usually emit
//! several events per save, so a reload is only handed on when the parsed
//! configuration differs from the one currently in effect. A file that fails
//! to load or validate is logged and ignored.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::loader::load_config;
use crate::config::schema::HealthConfig;

/// Decides which file events produce a reload.
pub struct ReloadFilter {
    path: PathBuf,
    current: HealthConfig,
}

impl ReloadFilter {
    pub fn new(path: &Path, current: HealthConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            current,
        }
    }

    /// The configuration to apply for `event`, if it changed anything.
    pub fn on_event(&mut self, event: &Event) -> Option<HealthConfig> {
        if !(event.kind.is_modify() || event.kind.is_create()) {
            return None;
        }

        match load_config(&self.path) {
            Ok(config) if config == self.current => {
                tracing::debug!(path = ?self.path, "Config file touched, contents unchanged");
                None
            }
            Ok(config) => {
                tracing::info!(
                    path = ?self.path,
                    providers = config.providers.len(),
                    "Config file changed, reloading"
                );
                self.current = config.clone();
                Some(config)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config, keeping current configuration"
                );
                None
            }
        }
    }
}

/// Watch `path` and call `on_reload` with every effective change.
///
/// `on_reload` runs on the watcher's thread. The returned watcher must be kept
/// alive for as long as reloads are wanted.
pub fn watch_config<F>(
    path: &Path,
    current: HealthConfig,
    mut on_reload: F,
) -> Result<RecommendedWatcher, notify::Error>
where
    F: FnMut(HealthConfig) + Send + 'static,
{
    let mut filter = ReloadFilter::new(path, current);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Some(config) = filter.on_event(&event) {
                    on_reload(config);
                }
            }
            Err(e) => tracing::error!(error = ?e, "Watch error"),
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;

    tracing::info!(path = ?path, "Config watcher started");
    Ok(watcher)
}
