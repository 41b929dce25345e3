use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::services::credentials::Credentials;

/// Asks the backend to begin processing a created job.
///
/// Best-effort: the call returns once the request is dispatched. Delivery
/// outcomes go to the log only.
pub trait ExecutionTrigger: Send + Sync {
    fn trigger(&self, job_id: Uuid) -> Result<(), TriggerError>;
}

/// Execution trigger that POSTs `{"job_id": ..}` to a backend function.
pub struct HttpExecutionTrigger {
    http: Client,
    url: String,
    api_key: String,
    credentials: Credentials,
}

impl HttpExecutionTrigger {
    pub fn new(
        base_url: &str,
        function: &str,
        api_key: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, TriggerError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: format!(
                "{}/functions/v1/{}",
                base_url.trim_end_matches('/'),
                function
            ),
            api_key: api_key.to_string(),
            credentials,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Spawn the request on a background task. Fails synchronously only when
    /// no caller credential is available.
    pub fn dispatch(&self, job_id: Uuid) -> Result<JoinHandle<()>, TriggerError> {
        let token = self
            .credentials
            .token()
            .ok_or(TriggerError::MissingCredential)?;

        let request = self
            .http
            .post(&self.url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .json(&serde_json::json!({ "job_id": job_id }));

        Ok(tokio::spawn(async move {
            let outcome = match request.send().await {
                Ok(response) if response.status().is_success() => Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    Err(TriggerError::Status { status, body })
                }
                Err(e) => Err(TriggerError::Http(e)),
            };

            match outcome {
                Ok(()) => tracing::debug!(job_id = %job_id, "Execution trigger acknowledged"),
                Err(e) => {
                    metrics::counter!("job_triggers_failed_total").increment(1);
                    tracing::warn!(
                        job_id = %job_id,
                        error = %e,
                        "Execution trigger not delivered, polling continues"
                    );
                }
            }
        }))
    }
}

impl ExecutionTrigger for HttpExecutionTrigger {
    fn trigger(&self, job_id: Uuid) -> Result<(), TriggerError> {
        self.dispatch(job_id).map(|_| ())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("No caller credential available to trigger execution")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Execution endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(credentials: Credentials) -> HttpExecutionTrigger {
        // Port 9 (discard) is closed on test hosts, so sends fail fast.
        HttpExecutionTrigger::new(
            "http://127.0.0.1:9/",
            "run-job",
            "anon-key",
            credentials,
            Duration::from_millis(500),
        )
        .unwrap()
    }

    #[test]
    fn test_function_url() {
        let trigger = trigger(Credentials::default());
        assert_eq!(trigger.url(), "http://127.0.0.1:9/functions/v1/run-job");
    }

    #[tokio::test]
    async fn test_trigger_returns_before_exchange_completes() {
        let trigger = trigger(Credentials::new(Some("jwt".to_string())));
        let started = std::time::Instant::now();
        assert!(trigger.trigger(Uuid::new_v4()).is_ok());
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_synchronously() {
        let trigger = trigger(Credentials::default());
        let result = trigger.trigger(Uuid::new_v4());
        assert!(matches!(result, Err(TriggerError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_propagated() {
        let trigger = trigger(Credentials::new(Some("jwt".to_string())));
        let handle = trigger.dispatch(Uuid::new_v4()).unwrap();
        // Dispatch returns before the request has even been attempted.
        assert!(!handle.is_finished());

        // The background task swallows the connection error after logging it.
        handle.await.unwrap();
    }
}
