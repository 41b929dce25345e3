use std::sync::Arc;

use crate::config::{AppConfig, PollSettings};
use crate::db::{self, queries::RestJobStore, JobGateway};
use crate::services::{
    circuit::CircuitRegistry,
    credentials::Credentials,
    inflight::PollRegistry,
    trigger::{ExecutionTrigger, HttpExecutionTrigger, TriggerError},
};

/// Shared orchestration state, built once at startup and cloned into every
/// caller. The registries are shared by all pollers in the process.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn JobGateway>,
    pub trigger: Arc<dyn ExecutionTrigger>,
    pub circuit: Arc<CircuitRegistry>,
    pub inflight: Arc<PollRegistry>,
    pub poll: PollSettings,
}

impl AppState {
    pub fn new(
        gateway: impl JobGateway + 'static,
        trigger: impl ExecutionTrigger + 'static,
        poll: PollSettings,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            trigger: Arc::new(trigger),
            circuit: Arc::new(CircuitRegistry::default()),
            inflight: Arc::new(PollRegistry::new()),
            poll,
        }
    }

    /// Wire the HTTP job store and execution trigger from configuration.
    pub fn from_config(config: &AppConfig, credentials: Credentials) -> Result<Self, InitError> {
        let http = db::init_http_client(std::time::Duration::from_secs(30))?;
        let gateway = RestJobStore::new(
            http,
            &config.job_store_url,
            &config.jobs_table,
            &config.job_store_api_key,
            credentials.clone(),
        );
        let trigger = HttpExecutionTrigger::new(
            &config.job_store_url,
            &config.execute_function,
            &config.job_store_api_key,
            credentials,
            config.trigger_timeout(),
        )?;
        Ok(Self::new(gateway, trigger, config.poll_settings()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to build execution trigger: {0}")]
    Trigger(#[from] TriggerError),
}
