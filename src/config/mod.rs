use serde::Deserialize;
use std::time::Duration;

/// Ceiling for the doubling backoff between poll reads.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Deployment flavour; selects the default poll budget.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Base URL of the hosted backend (e.g., "https://xyz.example.co")
    pub job_store_url: String,

    /// Project key sent as the `apikey` header on every request
    pub job_store_api_key: String,

    /// Caller access token. The execution trigger refuses to dispatch without one.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub app_env: Environment,

    /// Table holding job records
    #[serde(default = "default_jobs_table")]
    pub jobs_table: String,

    /// Function name of the execution endpoint
    #[serde(default = "default_execute_function")]
    pub execute_function: String,

    /// Upper bound on a single trigger dispatch
    #[serde(default = "default_trigger_timeout_ms")]
    pub trigger_timeout_ms: u64,

    #[serde(default)]
    pub poll_max_attempts: Option<u32>,

    #[serde(default)]
    pub poll_initial_interval_ms: Option<u64>,
}

fn default_jobs_table() -> String {
    "jobs".to_string()
}

fn default_execute_function() -> String {
    "run-job".to_string()
}

fn default_trigger_timeout_ms() -> u64 {
    5000
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_millis(self.trigger_timeout_ms)
    }

    /// Environment defaults with any explicit overrides applied.
    pub fn poll_settings(&self) -> PollSettings {
        let mut settings = PollSettings::for_environment(self.app_env);
        if let Some(attempts) = self.poll_max_attempts {
            settings.max_attempts = attempts;
        }
        if let Some(ms) = self.poll_initial_interval_ms {
            settings.initial_interval = Duration::from_millis(ms);
        }
        settings
    }
}

/// Default attempt budget and starting interval handed to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub initial_interval: Duration,
}

impl PollSettings {
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Production => Self {
                max_attempts: 60,
                initial_interval: Duration::from_millis(2000),
            },
            Environment::Development => Self {
                max_attempts: 30,
                initial_interval: Duration::from_millis(2000),
            },
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::for_environment(Environment::Production)
    }
}
