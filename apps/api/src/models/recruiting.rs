use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored at `jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub hr_uid: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Index entry stored at `hr/{uid}/jobs/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobIndexEntry {
    pub job_id: Uuid,
    pub title: String,
}

/// Stored at `applications/{job_id}/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_text: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// Stored at `interviews/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: Uuid,
    pub hr_uid: String,
    pub job_id: Uuid,
    pub application_id: Option<Uuid>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Index entry stored at `hr/{uid}/interviews/{interview_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewIndexEntry {
    pub interview_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub candidate_name: String,
}
