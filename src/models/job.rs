use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Lifecycle status of a generation job as stored by the job store.
///
/// `Succeeded` and `Failed` are terminal; the store never moves a job out of
/// either.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Kind of server-side generation work. Opaque to polling.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobType {
    HeadshotGenerate,
    BodyShotGenerate,
    OutfitRender,
    ReferenceMatch,
    AutoTag,
    ProductShot,
    OutfitSuggest,
    LookbookGenerate,
}

/// A job record as returned by the job store.
///
/// `result` and `error` are carried as-is: a `succeeded` job without a
/// result, or a `failed` job without an error message, is still terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: String,
    pub job_type: JobType,
    #[serde(default)]
    pub input: serde_json::Value,
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Insert payload for a new job. The store assigns `id`, `status` and the
/// timestamps.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewJob {
    #[garde(length(min = 1, max = 128))]
    pub owner_id: String,

    #[garde(skip)]
    pub job_type: JobType,

    #[garde(custom(object_or_null))]
    pub input: serde_json::Value,
}

impl NewJob {
    pub fn new(owner_id: impl Into<String>, job_type: JobType, input: serde_json::Value) -> Self {
        Self {
            owner_id: owner_id.into(),
            job_type,
            input,
        }
    }
}

fn object_or_null(value: &serde_json::Value, _ctx: &()) -> garde::Result {
    match value {
        serde_json::Value::Object(_) | serde_json::Value::Null => Ok(()),
        _ => Err(garde::Error::new("job input must be a JSON object")),
    }
}
