//! Test helper utilities: an in-memory job store and a recording trigger

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

use wardrobe_jobs::{
    db::{GatewayError, JobGateway},
    models::job::{Job, JobStatus, NewJob},
    services::trigger::{ExecutionTrigger, TriggerError},
};

#[derive(Default)]
struct StoreState {
    jobs: HashMap<Uuid, Job>,
    /// Per job: after this many reads, the job flips to the given record.
    flips: HashMap<Uuid, (usize, Job)>,
    reads: HashMap<Uuid, Vec<Instant>>,
    failing_reads: usize,
}

/// In-memory job store whose jobs change state after a scripted number of
/// reads, standing in for the backend finishing work on its own.
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.state.lock().jobs.insert(job.id, job);
    }

    pub fn set_status(&self, job_id: Uuid, status: JobStatus) {
        if let Some(job) = self.state.lock().jobs.get_mut(&job_id) {
            job.status = status;
            job.updated_at = Utc::now();
        }
    }

    /// Replace the record with `job` once `reads` reads have been served.
    pub fn flip_after_reads(&self, reads: usize, job: Job) {
        self.state.lock().flips.insert(job.id, (reads, job));
    }

    /// Make the next `count` reads fail with a transport-style error.
    pub fn fail_next_reads(&self, count: usize) {
        self.state.lock().failing_reads = count;
    }

    pub fn reads(&self, job_id: Uuid) -> usize {
        self.state.lock().reads.get(&job_id).map_or(0, Vec::len)
    }

    pub fn read_times(&self, job_id: Uuid) -> Vec<Instant> {
        self.state
            .lock()
            .reads
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobGateway for InMemoryJobStore {
    async fn create(&self, new_job: &NewJob) -> Result<Job, GatewayError> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            owner_id: new_job.owner_id.clone(),
            job_type: new_job.job_type,
            input: new_job.input.clone(),
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(job.clone());
        Ok(job)
    }

    async fn read(&self, job_id: Uuid) -> Result<Job, GatewayError> {
        let mut state = self.state.lock();
        state.reads.entry(job_id).or_default().push(Instant::now());
        let served = state.reads[&job_id].len();

        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(GatewayError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "upstream unavailable".to_string(),
            });
        }

        let due = state
            .flips
            .get(&job_id)
            .is_some_and(|(after, _)| served > *after);
        if due {
            if let Some((_, job)) = state.flips.remove(&job_id) {
                state.jobs.insert(job_id, job);
            }
        }

        state
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or(GatewayError::NotFound(job_id))
    }
}

/// Trigger that only records which jobs it was asked to start.
#[derive(Clone, Default)]
pub struct RecordingTrigger {
    pub triggered: Arc<Mutex<Vec<Uuid>>>,
}

impl ExecutionTrigger for RecordingTrigger {
    fn trigger(&self, job_id: Uuid) -> Result<(), TriggerError> {
        self.triggered.lock().push(job_id);
        Ok(())
    }
}
