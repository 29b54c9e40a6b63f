pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::attribution::handlers as attribution;
use crate::flow::handlers as course;
use crate::flow::resume::MAX_UPLOAD_BYTES;
use crate::hr::handlers as recruiting;
use crate::state::AppState;
use crate::videos::handlers as videos;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::home_handler))
        .route("/health", get(health::health_handler))
        .route("/course", get(health::home_handler))
        // Form flow
        .route("/api/v1/course", get(course::handle_get_course))
        .route("/api/v1/course/start", post(course::handle_start))
        .route(
            "/api/v1/course/resume",
            // Multipart framing on top of the file itself.
            post(course::handle_upload_resume)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route(
            "/api/v1/course/job-descriptions",
            post(course::handle_submit_job_descriptions),
        )
        .route("/api/v1/course/analyze", post(course::handle_analyze))
        .route("/api/v1/course/retry", post(course::handle_retry))
        .route("/api/v1/course/restart", post(course::handle_restart))
        .route("/api/v1/videos", get(videos::handle_search_videos))
        // Referral attribution
        .route(
            "/api/v1/visits/:code",
            post(attribution::handle_record_visit),
        )
        // Recruiting
        .route("/api/v1/jobs", get(recruiting::handle_list_jobs))
        .route("/api/v1/jobs/:id", get(recruiting::handle_get_job))
        .route("/api/v1/jobs/:id/apply", post(recruiting::handle_apply))
        .route(
            "/api/v1/interviews/:id",
            get(recruiting::handle_get_interview),
        )
        .route(
            "/api/v1/hr/jobs",
            get(recruiting::handle_hr_jobs).post(recruiting::handle_create_job),
        )
        .route(
            "/api/v1/hr/jobs/:id/applicants",
            get(recruiting::handle_applicants),
        )
        .route(
            "/api/v1/hr/interviews",
            get(recruiting::handle_hr_interviews).post(recruiting::handle_schedule_interview),
        )
        .route(
            "/api/v1/hr/referrals/:code",
            get(recruiting::handle_referral_report),
        )
        // Catch-all single segment; static routes above take precedence.
        .route("/:code", get(attribution::handle_referral_landing))
        .with_state(state)
}
