//! Per-job circuit breaker over consecutive job store read failures.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Consecutive read failures that open the circuit for a job id.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Process-wide map of job id to consecutive read failures.
///
/// Only gateway read errors count. A job that ends `failed` is a successful
/// read and clears the entry. Entries never expire on their own.
pub struct CircuitRegistry {
    failures: Mutex<HashMap<Uuid, u32>>,
    failure_threshold: u32,
}

impl CircuitRegistry {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            failures: Mutex::new(HashMap::new()),
            failure_threshold,
        }
    }

    /// Record a failed read and return the new consecutive count.
    pub fn record_failure(&self, job_id: Uuid) -> u32 {
        let count = {
            let mut failures = self.failures.lock();
            let count = failures.entry(job_id).or_insert(0);
            *count += 1;
            *count
        };

        if count == self.failure_threshold {
            metrics::counter!("job_circuit_trips_total").increment(1);
            warn!(
                job_id = %job_id,
                failures = count,
                "Circuit opened after consecutive read failures"
            );
        }
        count
    }

    /// Clear the entry after a successful terminal read.
    pub fn record_success(&self, job_id: Uuid) {
        self.failures.lock().remove(&job_id);
    }

    pub fn is_open(&self, job_id: Uuid) -> bool {
        self.failure_count(job_id) >= self.failure_threshold
    }

    pub fn failure_count(&self, job_id: Uuid) -> u32 {
        self.failures.lock().get(&job_id).copied().unwrap_or(0)
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Number of job ids with a recorded failure.
    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CircuitRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}
