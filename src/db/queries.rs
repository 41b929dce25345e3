use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use uuid::Uuid;

use super::{GatewayError, JobGateway};
use crate::models::job::{Job, NewJob};
use crate::services::credentials::Credentials;

/// Job store backed by a PostgREST-style table endpoint
/// (`{base}/rest/v1/{table}`).
pub struct RestJobStore {
    http: Client,
    base_url: String,
    table: String,
    api_key: String,
    credentials: Credentials,
}

impl RestJobStore {
    pub fn new(
        http: Client,
        base_url: &str,
        table: &str,
        api_key: &str,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            api_key: api_key.to_string(),
            credentials,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Attach the project key and the caller token, falling back to the
    /// project key when signed out.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .credentials
            .token()
            .unwrap_or_else(|| self.api_key.clone());
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn rows(response: Response) -> Result<Vec<Job>, GatewayError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthorized);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JobGateway for RestJobStore {
    async fn create(&self, job: &NewJob) -> Result<Job, GatewayError> {
        let response = self
            .authorize(self.http.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({
                "owner_id": job.owner_id,
                "job_type": job.job_type,
                "input": job.input,
                "status": "queued",
            }))
            .send()
            .await?;

        let created = Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::Empty)?;

        tracing::debug!(job_id = %created.id, job_type = %created.job_type, "Job record created");
        Ok(created)
    }

    async fn read(&self, job_id: Uuid) -> Result<Job, GatewayError> {
        let response = self
            .authorize(self.http.get(self.table_url()))
            .query(&[("id", format!("eq.{job_id}")), ("select", "*".to_string())])
            .send()
            .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound(job_id))
    }
}
