//! Axum route handlers for jobs, applications and interviews.
//!
//! `/api/v1/hr/*` routes require `HrAccess`. Candidate-facing routes are open.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::attribution::visitor::normalize_referral_code;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::hr::access::HrAccess;
use crate::models::recruiting::{
    Application, Interview, InterviewIndexEntry, JobIndexEntry, JobPosting,
};
use crate::state::AppState;

const MIN_INTERVIEW_MINUTES: u32 = 15;
const MAX_INTERVIEW_MINUTES: u32 = 480;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub name: String,
    pub email: String,
    pub resume_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub job_id: Uuid,
    pub application_id: Option<Uuid>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReferralVisitor {
    pub visitor_id: String,
    pub last_visit: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReferralReport {
    pub referral_code: String,
    pub visitor_count: usize,
    /// Most recent first.
    pub visitors: Vec<ReferralVisitor>,
}

fn default_duration() -> u32 {
    30
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

fn required_email(value: &str) -> Result<String, AppError> {
    let email = required("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation(format!("'{email}' is not a valid email"))),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads a job and checks that `hr` posted it. Other HR users get a 404.
async fn owned_job(state: &AppState, hr: &HrAccess, job_id: Uuid) -> Result<JobPosting, AppError> {
    state
        .repo
        .get_job(job_id)
        .await?
        .filter(|job| job.hr_uid == hr.uid)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate-facing handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobPosting>>, AppError> {
    let mut jobs = state.repo.list_jobs().await?;
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<Json<JobPosting>, AppError> {
    let job = state
        .repo
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    if state.repo.get_job(job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let application = Application {
        id: Uuid::new_v4(),
        job_id,
        name: required("name", &request.name)?,
        email: required_email(&request.email)?,
        resume_text: optional(request.resume_text),
        applied_at: Utc::now(),
    };
    state.repo.apply(&application).await?;

    info!("Application {} received for job {job_id}", application.id);
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Interview>, AppError> {
    let interview = state
        .repo
        .get_interview(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;
    Ok(Json(interview))
}

// ────────────────────────────────────────────────────────────────────────────
// HR handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/hr/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    hr: HrAccess,
    ApiJson(request): ApiJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    let job = JobPosting {
        id: Uuid::new_v4(),
        hr_uid: hr.uid,
        title: required("title", &request.title)?,
        description: required("description", &request.description)?,
        skills: request
            .skills
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        location: optional(request.location),
        created_at: Utc::now(),
    };
    state.repo.create_job(&job).await?;

    info!("Job {} posted by {}", job.id, job.hr_uid);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/hr/jobs
pub async fn handle_hr_jobs(
    State(state): State<AppState>,
    hr: HrAccess,
) -> Result<Json<Vec<JobIndexEntry>>, AppError> {
    Ok(Json(state.repo.hr_jobs(&hr.uid).await?))
}

/// GET /api/v1/hr/jobs/:id/applicants
pub async fn handle_applicants(
    State(state): State<AppState>,
    hr: HrAccess,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Application>>, AppError> {
    owned_job(&state, &hr, job_id).await?;
    let mut applicants = state.repo.applicants(job_id).await?;
    applicants.sort_by_key(|a| a.applied_at);
    Ok(Json(applicants))
}

/// POST /api/v1/hr/interviews
pub async fn handle_schedule_interview(
    State(state): State<AppState>,
    hr: HrAccess,
    ApiJson(request): ApiJson<ScheduleInterviewRequest>,
) -> Result<(StatusCode, Json<Interview>), AppError> {
    owned_job(&state, &hr, request.job_id).await?;

    let now = Utc::now();
    if request.scheduled_at <= now {
        return Err(AppError::Validation(
            "scheduled_at must be in the future".to_string(),
        ));
    }
    if !(MIN_INTERVIEW_MINUTES..=MAX_INTERVIEW_MINUTES).contains(&request.duration_minutes) {
        return Err(AppError::Validation(format!(
            "duration_minutes must be between {MIN_INTERVIEW_MINUTES} and {MAX_INTERVIEW_MINUTES}"
        )));
    }

    let interview = Interview {
        id: Uuid::new_v4(),
        hr_uid: hr.uid,
        job_id: request.job_id,
        application_id: request.application_id,
        candidate_name: required("candidate_name", &request.candidate_name)?,
        candidate_email: required_email(&request.candidate_email)?,
        scheduled_at: request.scheduled_at,
        duration_minutes: request.duration_minutes,
        meeting_link: optional(request.meeting_link),
        notes: optional(request.notes),
        created_at: now,
    };
    state.repo.schedule_interview(&interview).await?;

    info!(
        "Interview {} scheduled for {} at {}",
        interview.id, interview.candidate_name, interview.scheduled_at
    );
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/v1/hr/interviews
pub async fn handle_hr_interviews(
    State(state): State<AppState>,
    hr: HrAccess,
) -> Result<Json<Vec<InterviewIndexEntry>>, AppError> {
    Ok(Json(state.repo.hr_interviews(&hr.uid).await?))
}

/// GET /api/v1/hr/referrals/:code
///
/// Distinct visitors attributed to a referral code.
pub async fn handle_referral_report(
    State(state): State<AppState>,
    _hr: HrAccess,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<ReferralReport>, AppError> {
    let referral_code = normalize_referral_code(Some(&code))
        .ok_or_else(|| AppError::Validation(format!("'{code}' is not a valid referral code")))?;

    let mut visitors: Vec<ReferralVisitor> = state
        .repo
        .visits_for(&referral_code)
        .await?
        .into_iter()
        .map(|(visitor_id, record)| ReferralVisitor {
            visitor_id,
            last_visit: record.timestamp,
        })
        .collect();
    visitors.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));

    Ok(Json(ReferralReport {
        referral_code,
        visitor_count: visitors.len(),
        visitors,
    }))
}
