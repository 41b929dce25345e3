//! Caller-facing API: create a job, fire its trigger, and hand back a handle
//! that resolves to the terminal job record.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use garde::Validate;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::GatewayError;
use crate::models::job::{Job, JobType, NewJob};
use crate::services::poller::{AdaptivePoller, PollError, PollOptions};
use crate::services::resolver::CompletionResolver;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Invalid job request: {0}")]
    Invalid(#[from] garde::Report),

    #[error("Failed to create job: {0}")]
    Create(GatewayError),

    #[error(transparent)]
    Resolve(#[from] PollError),
}

impl OrchestratorError {
    /// True when the outcome is unknown rather than failed: the job may still
    /// finish server-side.
    pub fn is_timeout(&self) -> bool {
        matches!(self, OrchestratorError::Resolve(e) if e.is_timeout())
    }
}

pub struct JobOrchestrator {
    state: AppState,
    resolver: Arc<CompletionResolver>,
}

impl JobOrchestrator {
    pub fn new(state: AppState) -> Self {
        let poller = AdaptivePoller::new(
            state.gateway.clone(),
            state.circuit.clone(),
            state.inflight.clone(),
        );
        Self {
            resolver: Arc::new(CompletionResolver::new(poller)),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Create a job, fire the execution trigger without waiting on it, and
    /// return the id with a handle that resolves the job.
    ///
    /// Only creation failures are fatal. A trigger that cannot be sent is
    /// logged; the handle still polls, since the backend may pick the job up
    /// on its own.
    pub async fn create_and_run(
        &self,
        owner_id: &str,
        job_type: JobType,
        input: serde_json::Value,
    ) -> Result<(Uuid, ResolveHandle), OrchestratorError> {
        let new_job = NewJob::new(owner_id, job_type, input);
        new_job.validate()?;

        let job = self
            .state
            .gateway
            .create(&new_job)
            .await
            .map_err(OrchestratorError::Create)?;
        metrics::counter!("jobs_created_total", "job_type" => job_type.to_string()).increment(1);
        info!(job_id = %job.id, job_type = %job_type, "Job created");

        if let Err(e) = self.state.trigger.trigger(job.id) {
            metrics::counter!("job_triggers_failed_total").increment(1);
            warn!(job_id = %job.id, error = %e, "Execution trigger not sent, polling anyway");
        }

        Ok((job.id, self.resolve(job.id)))
    }

    /// Handle for a job created elsewhere, using the configured poll budget.
    pub fn resolve(&self, job_id: Uuid) -> ResolveHandle {
        ResolveHandle {
            job_id,
            resolver: self.resolver.clone(),
            options: self.state.poll.into(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Pending resolution of one job. Nothing is read until it is awaited.
pub struct ResolveHandle {
    job_id: Uuid,
    resolver: Arc<CompletionResolver>,
    options: PollOptions,
    cancel: CancellationToken,
}

impl ResolveHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_trace_tag(mut self, tag: impl Into<String>) -> Self {
        self.options.trace_tag = Some(tag.into());
        self
    }

    /// Token that stops the poll loop when cancelled, e.g. on screen teardown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> Result<Job, OrchestratorError> {
        let started = Instant::now();
        let outcome = self
            .resolver
            .resolve(self.job_id, &self.options, &self.cancel)
            .await;
        metrics::histogram!("job_resolve_seconds").record(started.elapsed().as_secs_f64());
        Ok(outcome?)
    }
}

impl IntoFuture for ResolveHandle {
    type Output = Result<Job, OrchestratorError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
