//! Axum route handlers for referral entry points.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::attribution::recorder::VisitOutcome;
use crate::errors::AppError;
use crate::extract::ApiPath;
use crate::redirect::RedirectPlan;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VisitResponse {
    pub referral_code: String,
    pub visitor_id: Uuid,
    pub new_visitor: bool,
    #[serde(flatten)]
    pub redirect: RedirectPlan,
}

fn confirmation_page(referral_code: &str, plan: &RedirectPlan) -> String {
    // Codes are restricted to [A-Za-z0-9_-], so they are safe to inline.
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Welcome to Pathway</title>
</head>
<body>
<p>Thanks for visiting through referral <strong>{referral_code}</strong>. Taking you to Pathway&hellip;</p>
<script>setTimeout(function () {{ window.location.replace("{to}"); }}, {delay});</script>
</body>
</html>"#,
        to = plan.redirect_to,
        delay = plan.redirect_after_ms,
    )
}

/// GET /:code
///
/// Referral landing page. Sets the attribution cookies, starts the tracking
/// write, and renders a confirmation that navigates home after the delay.
/// Unusable codes redirect home immediately.
pub async fn handle_referral_landing(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiPath(code): ApiPath<String>,
) -> Response {
    let (jar, outcome) = state.visits.record_visit(jar, Some(&code));
    match outcome {
        VisitOutcome::Skipped { redirect } => {
            (jar, Redirect::to(&redirect.redirect_to)).into_response()
        }
        VisitOutcome::Recorded(visit) => {
            let page = confirmation_page(&visit.referral_code, &visit.redirect);
            (
                jar,
                [(header::REFRESH, visit.redirect.refresh_header())],
                Html(page),
            )
                .into_response()
        }
    }
}

/// POST /api/v1/visits/:code
///
/// JSON variant for API clients that render their own confirmation.
pub async fn handle_record_visit(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiPath(code): ApiPath<String>,
) -> Result<(CookieJar, Json<VisitResponse>), AppError> {
    let (jar, outcome) = state.visits.record_visit(jar, Some(&code));
    match outcome {
        VisitOutcome::Skipped { .. } => Err(AppError::Validation(format!(
            "'{code}' is not a valid referral code"
        ))),
        VisitOutcome::Recorded(visit) => Ok((
            jar,
            Json(VisitResponse {
                referral_code: visit.referral_code,
                visitor_id: visit.identity.visitor_id,
                new_visitor: visit.identity.is_new,
                redirect: visit.redirect,
            }),
        )),
    }
}
