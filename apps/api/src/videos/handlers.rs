use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::Video;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub skill: Option<String>,
}

/// GET /api/v1/videos?skill=...
pub async fn handle_search_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> Result<Json<Vec<Video>>, AppError> {
    let skill = query
        .skill
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("skill query parameter is required".to_string()))?;

    Ok(Json(state.videos.search(skill).await?))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::routes::build_router;
    use crate::state::test_support::test_state;

    async fn get(uri: &str) -> (StatusCode, Value) {
        let app = build_router(test_state().state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_search_returns_videos_for_skill() {
        let (status, body) = get("/api/v1/videos?skill=Rust").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Learn Rust");
        assert_eq!(body[0]["embed_url"], "https://www.youtube.com/embed/Rust-id");
    }

    #[tokio::test]
    async fn test_missing_skill_is_rejected() {
        let (status, _) = get("/api/v1/videos?skill=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_failure_is_bad_gateway() {
        let (status, body) = get("/api/v1/videos?skill=broken").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "VIDEO_ERROR");
    }
}
