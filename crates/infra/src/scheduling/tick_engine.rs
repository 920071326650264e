//! Tokio-backed trigger engine.
//!
//! Each scheduled entry runs in its own lightweight task: a loop that parks
//! on its cancellation token or a full interval sleep, then awaits the tick
//! callback inline. Distinct entries tick concurrently; a single entry's
//! ticks never overlap, and the first tick fires only after one full
//! interval has elapsed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tickflow_core::{DrainSignal, EngineError, TickCallback, TriggerEngine};
use tickflow_domain::JobId;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct EntryHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct EngineState {
    live: bool,
    entries: HashMap<JobId, EntryHandle>,
    /// Join handles of removed entries, kept so `stop` still drains any
    /// invocation that was in flight at removal time.
    retired: Vec<JoinHandle<()>>,
}

/// Interval trigger engine with drain-on-stop semantics.
///
/// Engine methods must be called from within a tokio runtime; entry loops
/// are spawned onto the ambient runtime.
pub struct TickEngine {
    state: Mutex<EngineState>,
    root: CancellationToken,
    next_entry: AtomicU64,
}

impl TickEngine {
    /// Create a stopped engine. Call [`TriggerEngine::start`] to make it
    /// live.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState {
                live: false,
                entries: HashMap::new(),
                retired: Vec::new(),
            }),
            root: CancellationToken::new(),
            next_entry: AtomicU64::new(0),
        }
    }
}

impl Default for TickEngine {
    fn default() -> Self {
        Self::new()
    }
}

async fn tick_loop(every: Duration, tick: TickCallback, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            () = tokio::time::sleep(every) => tick().await,
        }
    }
}

impl TriggerEngine for TickEngine {
    fn start(&self) {
        let mut state = self.state.lock();
        if !state.live {
            state.live = true;
            debug!("trigger engine started");
        }
    }

    fn stop(&self) -> DrainSignal {
        let handles = {
            let mut state = self.state.lock();
            if !state.live {
                return DrainSignal::resolved(Ok(()));
            }
            state.live = false;
            // Cancelling under the lock closes the race with a concurrent
            // schedule(); token cancellation is non-blocking.
            self.root.cancel();
            let mut handles: Vec<JoinHandle<()>> =
                state.entries.drain().map(|(_, handle)| handle.task).collect();
            handles.append(&mut state.retired);
            handles
        };

        debug!(tasks = handles.len(), "trigger engine stopping, draining entry tasks");
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut result = Ok(());
            for handle in handles {
                match handle.await {
                    Ok(()) => {}
                    Err(err) if err.is_panic() => {
                        warn!(error = %err, "scheduled task panicked during drain");
                        result = Err(EngineError::TaskPanicked(err.to_string()));
                    }
                    Err(_) => {
                        if result.is_ok() {
                            result = Err(EngineError::Cancelled);
                        }
                    }
                }
            }
            let _ = tx.send(result);
        });
        DrainSignal::new(rx)
    }

    fn schedule(&self, every: Duration, tick: TickCallback) -> JobId {
        let id = JobId::new(self.next_entry.fetch_add(1, Ordering::Relaxed) + 1);
        let mut state = self.state.lock();
        // A child of the root token: stop() fans out to every entry in one
        // cancel. Scheduling on a stopped engine yields a loop that exits
        // immediately and never fires.
        let cancel = self.root.child_token();
        let task = tokio::spawn(tick_loop(every, tick, cancel.clone()));
        state.entries.insert(id, EntryHandle { cancel, task });
        debug!(entry = %id, ?every, "entry scheduled");
        id
    }

    fn remove(&self, id: JobId) {
        let mut state = self.state.lock();
        if let Some(handle) = state.entries.remove(&id) {
            handle.cancel.cancel();
            state.retired.push(handle.task);
            debug!(entry = %id, "entry removed");
        }
    }

    fn entries(&self) -> Vec<JobId> {
        self.state.lock().entries.keys().copied().collect()
    }
}
