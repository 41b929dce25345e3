//! Adaptive poller: reads a job until it reaches a terminal state, doubling
//! the wait between reads up to a ceiling.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{PollSettings, MAX_POLL_INTERVAL};
use crate::db::{GatewayError, JobGateway};
use crate::models::job::{Job, JobStatus};
use crate::services::circuit::CircuitRegistry;
use crate::services::inflight::PollRegistry;

/// Budget for a single poll run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    /// Observability tag attached to log lines; has no effect on behaviour.
    pub trace_tag: Option<String>,
}

impl PollOptions {
    pub fn new(max_attempts: u32, initial_interval: Duration) -> Self {
        Self {
            max_attempts,
            initial_interval,
            trace_tag: None,
        }
    }

    pub fn with_trace_tag(mut self, tag: impl Into<String>) -> Self {
        self.trace_tag = Some(tag.into());
        self
    }

    pub(crate) fn tag(&self) -> &str {
        self.trace_tag.as_deref().unwrap_or("-")
    }
}

impl From<PollSettings> for PollOptions {
    fn from(settings: PollSettings) -> Self {
        Self::new(settings.max_attempts, settings.initial_interval)
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        PollSettings::default().into()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Circuit open for job {0}: too many consecutive read failures")]
    CircuitOpen(Uuid),

    #[error("Job {0} is already being polled")]
    AlreadyPolling(Uuid),

    #[error("Failed to read job: {0}")]
    Read(#[from] GatewayError),

    #[error("Job {job_id} did not finish within {attempts} poll attempts")]
    Timeout { job_id: Uuid, attempts: u32 },

    #[error("Polling of job {0} was cancelled")]
    Cancelled(Uuid),
}

impl PollError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }
}

/// Next backoff interval: doubled, capped at `max`.
pub fn next_interval(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

pub struct AdaptivePoller {
    gateway: Arc<dyn JobGateway>,
    circuit: Arc<CircuitRegistry>,
    inflight: Arc<PollRegistry>,
    max_interval: Duration,
}

impl AdaptivePoller {
    pub fn new(
        gateway: Arc<dyn JobGateway>,
        circuit: Arc<CircuitRegistry>,
        inflight: Arc<PollRegistry>,
    ) -> Self {
        Self {
            gateway,
            circuit,
            inflight,
            max_interval: MAX_POLL_INTERVAL,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn JobGateway> {
        &self.gateway
    }

    pub fn circuit(&self) -> &Arc<CircuitRegistry> {
        &self.circuit
    }

    /// Poll `job_id` until it is terminal, the attempt budget runs out, a
    /// read fails, or `cancel` fires.
    ///
    /// A job that ends `failed` is returned as `Ok`; only problems with
    /// polling itself are errors.
    pub async fn poll(
        &self,
        job_id: Uuid,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<Job, PollError> {
        let tag = options.tag();

        if self.circuit.is_open(job_id) {
            debug!(job_id = %job_id, tag = %tag, "Circuit open, refusing to poll");
            return Err(PollError::CircuitOpen(job_id));
        }

        // Held until this function returns or its future is dropped.
        let _lease = self
            .inflight
            .lease(job_id)
            .ok_or(PollError::AlreadyPolling(job_id))?;

        let mut interval = options.initial_interval;

        for attempt in 1..=options.max_attempts {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled(job_id)),
                read = self.gateway.read(job_id) => read,
            };
            metrics::counter!("job_poll_reads_total").increment(1);

            let job = match read {
                Ok(job) => job,
                Err(e) => {
                    let failures = self.circuit.record_failure(job_id);
                    error!(
                        job_id = %job_id,
                        tag = %tag,
                        attempt,
                        failures,
                        error = %e,
                        "Job read failed"
                    );
                    return Err(PollError::Read(e));
                }
            };

            match job.status {
                JobStatus::Succeeded | JobStatus::Failed => {
                    self.circuit.record_success(job_id);
                    info!(
                        job_id = %job_id,
                        tag = %tag,
                        attempt,
                        status = %job.status,
                        "Job reached terminal state"
                    );
                    return Ok(job);
                }
                JobStatus::Queued | JobStatus::Running => {
                    debug!(
                        job_id = %job_id,
                        tag = %tag,
                        attempt,
                        max_attempts = options.max_attempts,
                        status = %job.status,
                        "Job still in progress"
                    );
                }
            }

            if attempt < options.max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(PollError::Cancelled(job_id)),
                    _ = tokio::time::sleep(interval) => {}
                }
                interval = next_interval(interval, self.max_interval);
            }
        }

        metrics::counter!("job_poll_timeouts_total").increment(1);
        Err(PollError::Timeout {
            job_id,
            attempts: options.max_attempts,
        })
    }
}
