//! Job record fixtures

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use wardrobe_jobs::models::job::{Job, JobStatus, JobType};

pub fn job(id: Uuid, status: JobStatus) -> Job {
    let created_at = Utc::now() - Duration::seconds(30);
    Job {
        id,
        owner_id: "user-42".to_string(),
        job_type: JobType::OutfitRender,
        input: json!({ "outfit_id": "outfit-7", "style": "studio" }),
        status,
        result: None,
        error: None,
        created_at,
        updated_at: Utc::now(),
    }
}

pub fn running(id: Uuid) -> Job {
    job(id, JobStatus::Running)
}

pub fn succeeded(id: Uuid) -> Job {
    Job {
        result: Some(json!({ "image_url": "renders/outfit-7.png" })),
        ..job(id, JobStatus::Succeeded)
    }
}

pub fn failed(id: Uuid) -> Job {
    Job {
        error: Some("Model refused the reference image".to_string()),
        ..job(id, JobStatus::Failed)
    }
}

/// Terminal records missing the payload their status implies.
pub fn succeeded_without_result(id: Uuid) -> Job {
    job(id, JobStatus::Succeeded)
}

pub fn failed_without_error(id: Uuid) -> Job {
    job(id, JobStatus::Failed)
}
