use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Process-wide set of job ids with a poll loop in flight.
#[derive(Debug, Default)]
pub struct PollRegistry {
    active: Mutex<HashSet<Uuid>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `job_id`. Returns false when another loop holds it.
    pub fn try_acquire(&self, job_id: Uuid) -> bool {
        self.active.lock().insert(job_id)
    }

    pub fn release(&self, job_id: Uuid) {
        self.active.lock().remove(&job_id);
    }

    /// Claim `job_id` and hand back a lease that releases it on drop.
    pub fn lease(self: &Arc<Self>, job_id: Uuid) -> Option<PollLease> {
        self.try_acquire(job_id).then(|| PollLease {
            registry: Arc::clone(self),
            job_id,
        })
    }

    pub fn is_polling(&self, job_id: Uuid) -> bool {
        self.active.lock().contains(&job_id)
    }

    pub fn in_flight(&self) -> usize {
        self.active.lock().len()
    }
}

/// Ownership of one job id in a [`PollRegistry`].
///
/// Dropping the lease releases the id, so every exit from a poll loop
/// (return, `?`, panic unwind, or the future being dropped) gives it back.
#[derive(Debug)]
pub struct PollLease {
    registry: Arc<PollRegistry>,
    job_id: Uuid,
}

impl PollLease {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }
}

impl Drop for PollLease {
    fn drop(&mut self) {
        self.registry.release(self.job_id);
    }
}
