//! Job Record Gateway: create and read access to the remote job store.
//!
//! Pure data access. Nothing here retries; callers decide what a failure means.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use uuid::Uuid;

use crate::models::job::{Job, NewJob};

pub mod queries;

/// Create/read operations against the job store.
#[async_trait]
pub trait JobGateway: Send + Sync {
    /// Insert a new job in the `queued` state and return the stored record.
    async fn create(&self, job: &NewJob) -> Result<Job, GatewayError>;

    /// Fetch the current record. Never cached.
    async fn read(&self, job_id: Uuid) -> Result<Job, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job store rejected credentials")]
    Unauthorized,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job store returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode job record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Job store returned no row for insert")]
    Empty,
}

/// Build the shared HTTP client for job store access.
pub fn init_http_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(request_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}
