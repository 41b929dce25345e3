use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::job::Job;
use crate::services::poller::{AdaptivePoller, PollError, PollOptions};

/// Wraps the poller with one extra read after a timeout, catching jobs that
/// finished between the last attempt and the give-up.
pub struct CompletionResolver {
    poller: AdaptivePoller,
}

impl CompletionResolver {
    pub fn new(poller: AdaptivePoller) -> Self {
        Self { poller }
    }

    pub fn poller(&self) -> &AdaptivePoller {
        &self.poller
    }

    pub async fn resolve(
        &self,
        job_id: Uuid,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<Job, PollError> {
        let timeout = match self.poller.poll(job_id, options, cancel).await {
            Err(e) if e.is_timeout() => e,
            other => return other,
        };

        if cancel.is_cancelled() {
            return Err(PollError::Cancelled(job_id));
        }

        // Final check: exactly one direct read, never a further loop.
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled(job_id)),
            read = self.poller.gateway().read(job_id) => read,
        };

        match read {
            Ok(job) if job.is_terminal() => {
                self.poller.circuit().record_success(job_id);
                metrics::counter!("job_final_check_hits_total").increment(1);
                info!(
                    job_id = %job_id,
                    tag = %options.tag(),
                    status = %job.status,
                    "Final check found job finished after poll timeout"
                );
                Ok(job)
            }
            Ok(job) => {
                warn!(
                    job_id = %job_id,
                    tag = %options.tag(),
                    status = %job.status,
                    "Job still in progress after poll timeout"
                );
                Err(timeout)
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    tag = %options.tag(),
                    error = %e,
                    "Final check read failed after poll timeout"
                );
                Err(timeout)
            }
        }
    }
}
