//! Shader hot reload watcher
//!
//! Watches the shader root for changes and reports which files changed, so
//! the cache can evict every program built from them. Uses debouncing to
//! avoid multiple reloads during rapid saves from editors.

use anyhow::{Context, Result};
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use shadecache_render::ShaderManager;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::time::{Duration, Instant};

/// Default debounce delay, matching the config default.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Event indicating a shader source file has changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReloadEvent {
    /// Path to the changed file
    pub path: PathBuf,
}

/// Manages file watching for shader hot reload
pub struct ShaderWatcher {
    _watcher: PollWatcher,
    event_receiver: Receiver<ShaderReloadEvent>,
    root: PathBuf,
    debounce_delay_ms: u64,
}

impl std::fmt::Debug for ShaderWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderWatcher")
            .field("root", &self.root)
            .field("debounce_delay_ms", &self.debounce_delay_ms)
            .finish_non_exhaustive()
    }
}

impl ShaderWatcher {
    /// Watch `root` recursively.
    ///
    /// Directories are watched rather than individual files because many
    /// editors save atomically (write temp + rename).
    pub fn new(root: &Path, debounce_delay_ms: u64) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Shader directory not found: {}", root.display());
        }
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let (tx, rx) = channel();
        let debounce_state: Arc<Mutex<HashMap<PathBuf, Instant>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let debounce_delay = Duration::from_millis(debounce_delay_ms);

        let mut watcher = PollWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("Shader watcher error: {e}");
                        return;
                    }
                };
                log::debug!(
                    "File system event: {:?} for paths: {:?}",
                    event.kind,
                    event.paths
                );

                if !matches!(
                    event.kind,
                    notify::EventKind::Modify(_)
                        | notify::EventKind::Create(_)
                        | notify::EventKind::Remove(_)
                ) {
                    log::trace!("Ignoring event kind: {:?}", event.kind);
                    return;
                }

                for path in event.paths {
                    if path.file_name().is_none() {
                        continue;
                    }

                    let should_send = {
                        let now = Instant::now();
                        let mut state = debounce_state.lock();
                        match state.get(&path) {
                            Some(last) if now.duration_since(*last) < debounce_delay => {
                                log::trace!("Debouncing shader reload for {}", path.display());
                                false
                            }
                            _ => {
                                state.insert(path.clone(), now);
                                true
                            }
                        }
                    };

                    if should_send {
                        log::info!("Shader file changed: {}", path.display());
                        if let Err(e) = tx.send(ShaderReloadEvent { path }) {
                            log::error!("Failed to send shader reload event: {}", e);
                        }
                    }
                }
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch shader directory: {}", root.display()))?;
        log::info!("Shader hot reload: watching {}", root.display());

        Ok(Self {
            _watcher: watcher,
            event_receiver: rx,
            root,
            debounce_delay_ms,
        })
    }

    /// Check for a pending reload event (non-blocking)
    pub fn try_recv(&self) -> Option<ShaderReloadEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for a reload event.
    ///
    /// Returns `None` on timeout or once the watcher has shut down.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ShaderReloadEvent> {
        match self.event_receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Evict every cached program built from a changed file. Returns the
    /// changed paths that affected at least one entry.
    pub fn apply_pending(&self, manager: &mut ShaderManager) -> Vec<PathBuf> {
        let mut affected = Vec::new();
        while let Some(event) = self.try_recv() {
            if manager.invalidate_file(&event.path) > 0 {
                affected.push(event.path);
            }
        }
        affected
    }

    /// The watched directory (canonicalized when possible)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the debounce delay in milliseconds
    pub fn debounce_delay_ms(&self) -> u64 {
        self.debounce_delay_ms
    }
}

/// Builder for creating ShaderWatcher with configuration options
pub struct ShaderWatcherBuilder {
    root: Option<PathBuf>,
    debounce_delay_ms: u64,
}

impl ShaderWatcherBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            debounce_delay_ms: DEFAULT_DEBOUNCE_MS,
        }
    }

    /// Set the directory to watch
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Set the debounce delay in milliseconds
    pub fn debounce_delay_ms(mut self, delay_ms: u64) -> Self {
        self.debounce_delay_ms = delay_ms;
        self
    }

    pub fn build(self) -> Result<ShaderWatcher> {
        let root = self
            .root
            .context("No shader directory provided for hot reload")?;
        ShaderWatcher::new(&root, self.debounce_delay_ms)
    }
}

impl Default for ShaderWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
