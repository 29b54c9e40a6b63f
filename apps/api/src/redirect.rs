//! Delayed navigation handed to the client.
//!
//! The server never owns a navigation timer. A `RedirectPlan` is rendered into a
//! `Refresh` header plus the JSON/HTML body, and the page that shows it owns the
//! timer, so tearing the page down cancels the navigation.

use std::time::Duration;

use axum::http::HeaderValue;
use serde::Serialize;

/// Default delay before navigating away from a confirmation or warning message.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

pub const HOME_PATH: &str = "/";
pub const HR_LOGIN_PATH: &str = "/hr/login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectPlan {
    pub redirect_to: String,
    pub redirect_after_ms: u64,
}

impl RedirectPlan {
    pub fn new(to: impl Into<String>, after: Duration) -> Self {
        Self {
            redirect_to: to.into(),
            redirect_after_ms: after.as_millis() as u64,
        }
    }

    pub fn after(&self) -> Duration {
        Duration::from_millis(self.redirect_after_ms)
    }

    /// `Refresh` only takes whole seconds, so the delay is rounded up.
    /// The page script navigates at the exact millisecond delay.
    pub fn refresh_header(&self) -> HeaderValue {
        let seconds = self.redirect_after_ms.div_ceil(1000);
        HeaderValue::from_str(&format!("{seconds}; url={}", self.redirect_to))
            .unwrap_or_else(|_| HeaderValue::from_static("2; url=/"))
    }
}
