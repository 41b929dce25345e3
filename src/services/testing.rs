//! Scripted job store for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::db::{GatewayError, JobGateway};
use crate::models::job::{Job, JobStatus, JobType, NewJob};

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Status(JobStatus),
    ReadError,
    /// Answers with the status only after the delay elapses.
    Delayed(Duration, JobStatus),
}

pub fn job(id: Uuid, status: JobStatus) -> Job {
    let now = Utc::now();
    Job {
        id,
        owner_id: "user-1".to_string(),
        job_type: JobType::OutfitRender,
        input: serde_json::json!({}),
        status,
        result: (status == JobStatus::Succeeded).then(|| serde_json::json!({"url": "r.png"})),
        error: (status == JobStatus::Failed).then(|| "render failed".to_string()),
        created_at: now,
        updated_at: now,
    }
}

/// Replays `script` one step per read, then repeats `fallback`.
pub struct ScriptedGateway {
    job_id: Uuid,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    reads: AtomicUsize,
    read_times: Mutex<Vec<Instant>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Step>, fallback: Step) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            script: Mutex::new(script.into()),
            fallback,
            reads: AtomicUsize::new(0),
            read_times: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(step: Step) -> Self {
        Self::new(Vec::new(), step)
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn read_times(&self) -> Vec<Instant> {
        self.read_times.lock().clone()
    }
}

#[async_trait]
impl JobGateway for ScriptedGateway {
    async fn create(&self, _job: &NewJob) -> Result<Job, GatewayError> {
        Ok(job(self.job_id, JobStatus::Queued))
    }

    async fn read(&self, job_id: Uuid) -> Result<Job, GatewayError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read_times.lock().push(Instant::now());
        let step = self.script.lock().pop_front().unwrap_or(self.fallback);
        match step {
            Step::Status(status) => Ok(job(job_id, status)),
            Step::ReadError => Err(GatewayError::NotFound(job_id)),
            Step::Delayed(delay, status) => {
                tokio::time::sleep(delay).await;
                Ok(job(job_id, status))
            }
        }
    }
}
