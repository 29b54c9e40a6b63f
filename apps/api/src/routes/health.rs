use axum::{response::Html, Json};
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "pathway-api"
    }))
}

/// GET /
/// GET /course
/// Landing page that referral redirects arrive at, also the course entry point.
pub async fn home_handler() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Pathway</title>
</head>
<body>
<h1>Pathway</h1>
<p>Upload your resume, paste the jobs you want, and get a learning path for the skills you are missing.</p>
<p><a href="/api/v1/course">Start</a> &middot; <a href="/api/v1/jobs">Open positions</a></p>
</body>
</html>"#,
    )
}
