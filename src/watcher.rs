//! Env File Watcher
//!
//! One background worker per watched file. The worker arms a non-recursive
//! `notify` watch on the file's parent directory (watching the file itself
//! misses editors that replace it via rename and configmap-style symlink
//! swaps), then dispatches matching create/modify events to the caller's
//! callback. Removal of the watched file, a closed event channel, or a
//! notification-stream failure ends the worker; there is no re-arm.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use crate::error::Error;
use crate::Result;

/// Lifecycle of one watch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Worker spawned, watch not yet armed.
    Initializing,
    /// Watch armed; events are being dispatched.
    Watching,
    /// Watched file removed or event channel closed. Terminal.
    Stopped,
    /// Notification stream failed. Terminal.
    Errored,
}

type ChangeCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// A live watch on one resolved env file.
///
/// `spawn` returns only after the watch is armed, so a change made after it
/// returns will be observed. A session ends on its own when its file is
/// removed or the stream fails; a caller wanting coverage across a
/// remove-and-recreate cycle spawns a new session.
#[derive(Debug)]
pub struct WatchSession {
    path: PathBuf,
    state: Arc<Mutex<WatchState>>,
    worker: JoinHandle<()>,
}

impl WatchSession {
    /// Watch `path` and invoke `on_change` with each triggering event. The
    /// callback runs on the session's worker thread.
    pub fn spawn<P, F>(path: P, on_change: F) -> Result<Self>
    where
        P: Into<PathBuf>,
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self::spawn_shared(path.into(), Arc::new(on_change))
    }

    pub(crate) fn spawn_shared(path: PathBuf, on_change: ChangeCallback) -> Result<Self> {
        let state = Arc::new(Mutex::new(WatchState::Initializing));
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker_path = path.clone();
        let worker_state = Arc::clone(&state);
        let worker = thread::spawn(move || {
            worker_loop(worker_path, on_change, worker_state, ready_tx);
        });

        // Block until the worker has armed the watch (or failed to).
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                path,
                state,
                worker,
            }),
            Ok(Err(source)) => Err(Error::WatchSetup { path, source }),
            Err(_) => Err(Error::WatchSetup {
                path,
                source: notify::Error::generic("watch worker exited before arming"),
            }),
        }
    }

    /// The watched file path as configured.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WatchState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// True while the worker thread is still running.
    pub fn is_active(&self) -> bool {
        !self.worker.is_finished()
    }
}

fn worker_loop(
    path: PathBuf,
    on_change: ChangeCallback,
    state: Arc<Mutex<WatchState>>,
    ready_tx: mpsc::Sender<notify::Result<()>>,
) {
    let (event_tx, event_rx) = mpsc::channel();
    let mut watcher = match notify::recommended_watcher(event_tx) {
        Ok(watcher) => watcher,
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    let watch_dir = parent_dir(&path);
    if let Err(err) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        let _ = ready_tx.send(Err(err));
        return;
    }
    set_state(&state, WatchState::Watching);
    debug!(
        "watching {} for changes to {}",
        watch_dir.display(),
        path.display()
    );
    let _ = ready_tx.send(Ok(()));

    // Last known symlink-resolved target, for detecting atomic replaces of
    // a symlinked file where no event names the file itself.
    let mut real_path = std::fs::canonicalize(&path).ok();

    loop {
        match event_rx.recv() {
            Ok(Ok(event)) => {
                let names_watched_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == path.file_name());
                let current_real_path = std::fs::canonicalize(&path).ok();
                let target_swapped =
                    current_real_path.is_some() && current_real_path != real_path;

                if (names_watched_file
                    && matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)))
                    || target_swapped
                {
                    debug!("env file changed: {:?}", event);
                    real_path = current_real_path;
                    on_change(&event);
                } else if names_watched_file && matches!(event.kind, EventKind::Remove(_)) {
                    info!("watched env file removed: {}", path.display());
                    set_state(&state, WatchState::Stopped);
                    return;
                }
            }
            Ok(Err(err)) => {
                error!("watch stream error for {}: {}", path.display(), err);
                set_state(&state, WatchState::Errored);
                return;
            }
            // Event channel closed.
            Err(_) => {
                set_state(&state, WatchState::Stopped);
                return;
            }
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn set_state(state: &Arc<Mutex<WatchState>>, value: WatchState) {
    if let Ok(mut guard) = state.lock() {
        *guard = value;
    }
}
