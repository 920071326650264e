//! Active-jobs registry mapping job identifiers to cancellation tokens.

use std::collections::HashMap;

use parking_lot::Mutex;
use tickflow_domain::JobId;
use tokio_util::sync::CancellationToken;

/// Thread-safe mapping from [`JobId`] to the job's cancellation token.
///
/// Every read, write, and iteration goes through the single mutex. No
/// operation holds the lock across a blocking call; cancelling a token is
/// non-blocking and safe under the lock.
#[derive(Debug, Default)]
pub struct ActiveJobs {
    jobs: Mutex<HashMap<JobId, CancellationToken>>,
}

impl ActiveJobs {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `token` under `id`. Entries are created at job registration.
    pub fn register(&self, id: JobId, token: CancellationToken) {
        self.jobs.lock().insert(id, token);
    }

    /// Cancel the token registered under `id`, if any.
    ///
    /// Returns whether a token was found. Cancelling an already-cancelled or
    /// already-removed token is a no-op, not an error.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.jobs.lock().get(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every remaining token, returning how many were signalled.
    ///
    /// Used by shutdown after the engine has drained.
    pub fn cancel_all(&self) -> usize {
        let jobs = self.jobs.lock();
        for token in jobs.values() {
            token.cancel();
        }
        jobs.len()
    }

    /// Drop the entry for `id`. Called by the per-job watcher once it has
    /// observed cancellation.
    pub fn remove(&self, id: JobId) {
        self.jobs.lock().remove(&id);
    }

    /// Whether `id` is currently registered.
    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.lock().contains_key(&id)
    }

    /// Snapshot of the registered identifiers, in no particular order.
    pub fn ids(&self) -> Vec<JobId> {
        self.jobs.lock().keys().copied().collect()
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// True when no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}
