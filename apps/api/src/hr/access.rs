use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::errors::AppError;
use crate::state::AppState;

/// Set by the external sign-in flow; its presence is the HR access flag.
pub const HR_SESSION_COOKIE: &str = "hr_uid";

/// Extractor for HR-only routes. Rejects with `AppError::Unauthorized`, which
/// warns and sends the browser to the HR login view after the configured delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrAccess {
    pub uid: String,
}

fn valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid.len() <= 128
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl FromRequestParts<AppState> for HrAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match CookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        jar.get(HR_SESSION_COOKIE)
            .map(|c| c.value().trim().to_string())
            .filter(|uid| valid_uid(uid))
            .map(|uid| HrAccess { uid })
            .ok_or(AppError::Unauthorized {
                redirect_after: state.config.redirect_delay,
            })
    }
}
