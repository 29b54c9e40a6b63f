//! Axum route handlers for the course flow.
//!
//! The session id lives in the `session_id` cookie and is issued on first
//! contact. Every mutation runs load → apply → save under that session's lock.

use axum::{
    extract::{Multipart, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::flow::analysis::run_analysis;
use crate::flow::resume::parse_resume;
use crate::flow::session::{load_session, save_session};
use crate::flow::stage::Stage;
use crate::flow::state::{
    ApplicationState, FlowAction, FlowError, JobDescription, JobDescriptionData,
};
use crate::flow::view::CourseResponse;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_id";
const MAX_JOB_DESCRIPTIONS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobDescriptionInput {
    #[serde(default)]
    pub title: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct JobDescriptionsRequest {
    pub descriptions: Vec<JobDescriptionInput>,
}

type CourseResult = Result<(CookieJar, Json<CourseResponse>), AppError>;

// ────────────────────────────────────────────────────────────────────────────
// Session plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Reads the session id cookie, issuing a new one when absent or malformed.
fn session_id(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (jar, id);
    }
    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

/// Applies one action to the stored session under its lock.
async fn transition(
    state: &AppState,
    id: Uuid,
    action: FlowAction,
) -> Result<ApplicationState, AppError> {
    let _guard = state.session_locks.lock(id).await;
    let mut session = load_session(state.sessions.as_ref(), id).await?;
    let name = action.name();
    let from = session.stage;

    session.apply(action)?;
    save_session(
        state.sessions.as_ref(),
        id,
        &session,
        state.config.session_ttl,
    )
    .await?;

    info!(session_id = %id, "{name}: {from} -> {}", session.stage);
    Ok(session)
}

fn respond(jar: CookieJar, session: &ApplicationState) -> CourseResult {
    Ok((jar, Json(CourseResponse::from(session))))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/course
///
/// Returns the single view for the session's current stage.
pub async fn handle_get_course(State(state): State<AppState>, jar: CookieJar) -> CourseResult {
    let (jar, id) = session_id(jar);
    let session = load_session(state.sessions.as_ref(), id).await?;
    respond(jar, &session)
}

/// POST /api/v1/course/start
pub async fn handle_start(State(state): State<AppState>, jar: CookieJar) -> CourseResult {
    let (jar, id) = session_id(jar);
    let session = transition(&state, id, FlowAction::Start).await?;
    respond(jar, &session)
}

/// POST /api/v1/course/resume
///
/// Multipart upload with a `file` field (PDF or plain text).
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> CourseResult {
    let (jar, id) = session_id(jar);

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
        upload = Some((file_name, content_type, bytes));
        break;
    }
    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;

    // PDF extraction is CPU-bound.
    let resume = tokio::task::spawn_blocking(move || {
        parse_resume(&file_name, content_type.as_deref(), bytes)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    let session = transition(&state, id, FlowAction::ResumeParsed(resume)).await?;
    respond(jar, &session)
}

/// POST /api/v1/course/job-descriptions
///
/// Stores 1–5 job descriptions and moves the session into ANALYZING.
pub async fn handle_submit_job_descriptions(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<JobDescriptionsRequest>,
) -> CourseResult {
    let (jar, id) = session_id(jar);
    let data = validate_job_descriptions(request)?;
    let session = transition(&state, id, FlowAction::JobDescriptionsParsed(data)).await?;
    respond(jar, &session)
}

/// POST /api/v1/course/analyze
///
/// Runs the analysis for a session in ANALYZING. Success moves to RESULTS;
/// failure moves back to JOB_DESCRIPTIONS with the error recorded for retry.
pub async fn handle_analyze(State(state): State<AppState>, jar: CookieJar) -> CourseResult {
    let (jar, id) = session_id(jar);
    let _guard = state.session_locks.lock(id).await;

    let mut session = load_session(state.sessions.as_ref(), id).await?;
    if session.stage != Stage::Analyzing {
        return Err(FlowError::InvalidTransition {
            from: session.stage,
            action: "analyze",
        }
        .into());
    }

    let outcome = match run_analysis(&session, state.analyzer.as_ref()).await {
        Ok(outcome) => outcome,
        Err(err) => {
            // Step back to the first missing input instead of parking in ANALYZING.
            session.apply(FlowAction::InputsMissing)?;
            save_session(
                state.sessions.as_ref(),
                id,
                &session,
                state.config.session_ttl,
            )
            .await?;
            warn!(session_id = %id, "{err}; moved back to {}", session.stage);
            return Err(err.into());
        }
    };
    session.apply(outcome)?;
    save_session(
        state.sessions.as_ref(),
        id,
        &session,
        state.config.session_ttl,
    )
    .await?;

    info!(session_id = %id, "analysis finished: ANALYZING -> {}", session.stage);
    respond(jar, &session)
}

/// POST /api/v1/course/retry
pub async fn handle_retry(State(state): State<AppState>, jar: CookieJar) -> CourseResult {
    let (jar, id) = session_id(jar);
    let session = transition(&state, id, FlowAction::RetryAnalysis).await?;
    respond(jar, &session)
}

/// POST /api/v1/course/restart
pub async fn handle_restart(State(state): State<AppState>, jar: CookieJar) -> CourseResult {
    let (jar, id) = session_id(jar);
    let session = transition(&state, id, FlowAction::Restart).await?;
    respond(jar, &session)
}

fn validate_job_descriptions(
    request: JobDescriptionsRequest,
) -> Result<JobDescriptionData, AppError> {
    if request.descriptions.is_empty() {
        return Err(AppError::Validation(
            "at least one job description is required".to_string(),
        ));
    }
    if request.descriptions.len() > MAX_JOB_DESCRIPTIONS {
        return Err(AppError::Validation(format!(
            "at most {MAX_JOB_DESCRIPTIONS} job descriptions are allowed"
        )));
    }

    let mut descriptions = Vec::with_capacity(request.descriptions.len());
    for (i, input) in request.descriptions.into_iter().enumerate() {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(format!(
                "job description {} has no text",
                i + 1
            )));
        }
        let title = match input.title.trim() {
            "" => format!("Job {}", i + 1),
            t => t.to_string(),
        };
        descriptions.push(JobDescription {
            title,
            text: text.to_string(),
        });
    }
    Ok(JobDescriptionData { descriptions })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;
    use crate::flow::analysis::fakes::FakeAnalyzer;
    use crate::flow::session::SessionStore;
    use crate::routes::build_router;
    use crate::state::test_support::{test_state, TestHarness};

    const BOUNDARY: &str = "pathway-boundary";

    fn app(harness: &TestHarness) -> Router {
        build_router(harness.state.clone())
    }

    fn cookie(id: Uuid) -> String {
        format!("{SESSION_COOKIE}={id}")
    }

    fn post(uri: &str, id: Uuid) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie(id))
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, id: Uuid, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie(id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload(id: Uuid, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/course/resume")
            .header(header::COOKIE, cookie(id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    fn jd_body() -> Value {
        json!({ "descriptions": [{ "title": "Platform Engineer", "text": "Kubernetes, Rust" }] })
    }

    async fn drive_to_analyzing(app: &Router, id: Uuid) {
        assert_eq!(send(app, post("/api/v1/course/start", id)).await.0, StatusCode::OK);
        assert_eq!(
            send(app, upload(id, "cv.txt", "Rust engineer, 5 years")).await.0,
            StatusCode::OK
        );
        let (status, body) = send(
            app,
            post_json("/api/v1/course/job-descriptions", id, jd_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "ANALYZING");
    }

    #[tokio::test]
    async fn test_first_visit_issues_session_cookie() {
        let harness = test_state();
        let request = Request::builder()
            .uri("/api/v1/course")
            .body(Body::empty())
            .unwrap();

        let response = app(&harness).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("session_id="));
        assert!(set_cookie.contains("HttpOnly"));

        let body = json_body(response).await;
        assert_eq!(body["stage"], "WELCOME");
        assert_eq!(body["view"], "welcome");
    }

    #[tokio::test]
    async fn test_full_flow_reaches_results() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();

        drive_to_analyzing(&app, id).await;
        let (status, body) = send(&app, post("/api/v1/course/analyze", id)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "RESULTS");
        assert_eq!(body["view"], "learning_path");
        assert_eq!(body["analysis"]["missing_skills"][0], "Kubernetes");
        assert_eq!(harness.analyzer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_upload_advances_to_job_descriptions() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();

        send(&app, post("/api/v1/course/start", id)).await;
        let (status, body) = send(&app, upload(id, "cv.txt", "Rust engineer")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "JOB_DESCRIPTIONS");
        assert_eq!(body["resume_file_name"], "cv.txt");

        let stored = load_session(harness.sessions.as_ref(), id).await.unwrap();
        assert_eq!(stored.resume_data.unwrap().text, "Rust engineer");
        assert!(stored.job_description_data.is_none());
        assert!(stored.analysis_result.is_none());
    }

    #[tokio::test]
    async fn test_skipping_a_stage_is_conflict() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();

        let (status, body) = send(
            &app,
            post_json("/api/v1/course/job-descriptions", id, jd_body()),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, _) = send(&app, post("/api/v1/course/analyze", id)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_analysis_failure_returns_to_job_descriptions_then_retries() {
        let harness = TestHarness::with_analyzer(FakeAnalyzer::failing());
        let app = app(&harness);
        let id = Uuid::new_v4();

        drive_to_analyzing(&app, id).await;
        let (status, body) = send(&app, post("/api/v1/course/analyze", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "JOB_DESCRIPTIONS");
        assert_eq!(body["can_retry"], true);
        assert!(body["analysis_error"].as_str().unwrap().contains("upstream timeout"));

        let (status, body) = send(&app, post("/api/v1/course/retry", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "ANALYZING");
        assert_eq!(body["view"], "analysis_in_progress");
    }

    #[tokio::test]
    async fn test_analyzing_without_payloads_fails_fast() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();
        harness
            .sessions
            .insert_raw(id, json!({
                "stage": "ANALYZING",
                "resume_data": null,
                "job_description_data": null,
                "analysis_result": null,
                "analysis_error": null,
                "updated_at": "2026-01-01T00:00:00Z"
            }).to_string())
            .await;

        let (status, body) = send(&app, post("/api/v1/course/analyze", id)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "MISSING_PREREQUISITES");
        assert_eq!(harness.analyzer.call_count(), 0);

        // The session no longer sits in ANALYZING.
        let stored = load_session(harness.sessions.as_ref(), id).await.unwrap();
        assert_eq!(stored.stage, Stage::Resume);

        let (status, body) = send(&app, post("/api/v1/course/analyze", id)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_resubmitting_job_descriptions_after_failure_is_rejected() {
        let harness = TestHarness::with_analyzer(FakeAnalyzer::failing());
        let app = app(&harness);
        let id = Uuid::new_v4();

        drive_to_analyzing(&app, id).await;
        send(&app, post("/api/v1/course/analyze", id)).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/course/job-descriptions",
                id,
                json!({ "descriptions": [{ "title": "Different", "text": "Go" }] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let stored = load_session(harness.sessions.as_ref(), id).await.unwrap();
        assert_ne!(
            stored.job_description_data.unwrap().descriptions[0].title,
            "Different"
        );
    }

    #[tokio::test]
    async fn test_corrupt_stage_renders_welcome() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();
        harness
            .sessions
            .insert_raw(id, r#"{"stage": "HIRED"}"#)
            .await;

        let request = Request::builder()
            .uri("/api/v1/course")
            .header(header::COOKIE, cookie(id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "WELCOME");
        assert_eq!(body["view"], "welcome");
    }

    #[tokio::test]
    async fn test_restart_from_results() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();

        drive_to_analyzing(&app, id).await;
        send(&app, post("/api/v1/course/analyze", id)).await;
        let (status, body) = send(&app, post("/api/v1/course/restart", id)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "WELCOME");
        let raw = harness.sessions.load(id).await.unwrap().unwrap();
        assert!(raw.contains("\"resume_data\":null"));
    }

    #[tokio::test]
    async fn test_missing_file_field_is_validation_error() {
        let harness = test_state();
        let app = app(&harness);
        let id = Uuid::new_v4();
        send(&app, post("/api/v1/course/start", id)).await;

        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/course/resume")
            .header(header::COOKIE, cookie(id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_job_description_validation() {
        let too_many = JobDescriptionsRequest {
            descriptions: (0..6)
                .map(|_| JobDescriptionInput {
                    title: String::new(),
                    text: "x".to_string(),
                })
                .collect(),
        };
        assert!(validate_job_descriptions(too_many).is_err());

        let blank = JobDescriptionsRequest {
            descriptions: vec![JobDescriptionInput {
                title: "SRE".to_string(),
                text: "   ".to_string(),
            }],
        };
        assert!(validate_job_descriptions(blank).is_err());

        let untitled = JobDescriptionsRequest {
            descriptions: vec![JobDescriptionInput {
                title: " ".to_string(),
                text: "Rust".to_string(),
            }],
        };
        let data = validate_job_descriptions(untitled).unwrap();
        assert_eq!(data.descriptions[0].title, "Job 1");
    }
}
