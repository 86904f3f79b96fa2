//! Per-job-id serialization of poll cycles.
//!
//! Two polls of the same job id never interleave; different ids never wait
//! on each other. Entries are dropped once nobody holds or waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of async locks keyed by upstream job id.
#[derive(Default)]
pub struct JobLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one poll cycle.
pub struct JobLockGuard<'a> {
    locks: &'a JobLocks,
    job_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other poll of `job_id` is running, then hold it.
    pub async fn acquire(&self, job_id: &str) -> JobLockGuard<'_> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(job_id.to_string()).or_default())
        };
        let guard = lock.lock_owned().await;
        JobLockGuard {
            locks: self,
            job_id: job_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids currently held or waited on.
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for JobLockGuard<'_> {
    fn drop(&mut self) {
        // Release first so the strong count only reflects the map and waiters.
        drop(self.guard.take());
        let mut map = self
            .locks
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if map
            .get(&self.job_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.job_id);
        }
    }
}
