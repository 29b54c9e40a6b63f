//! Visitor identity and referral cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

pub const REFERRAL_COOKIE: &str = "referral";
pub const VISITOR_COOKIE: &str = "visitorId";
/// Both cookies live for 30 days.
pub const RETENTION_DAYS: i64 = 30;
const MAX_REFERRAL_CODE_LEN: usize = 64;
/// First path segments owned by the app itself; never referral codes.
pub const RESERVED_PATHS: &[&str] = &["api", "course", "health", "hr", "login"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub visitor_id: Uuid,
    /// True when this request generated the id.
    pub is_new: bool,
}

/// Trims the code and checks it is a single URL-safe token that does not
/// collide with an app path. `None` means there is nothing to attribute.
pub fn normalize_referral_code(raw: Option<&str>) -> Option<String> {
    let code = raw?.trim();
    if code.is_empty() || code.len() > MAX_REFERRAL_CODE_LEN {
        return None;
    }
    if RESERVED_PATHS.iter().any(|r| r.eq_ignore_ascii_case(code)) {
        return None;
    }
    code.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .then(|| code.to_string())
}

fn retained_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .max_age(time::Duration::days(RETENTION_DAYS))
        .same_site(SameSite::Lax)
        .build()
}

/// Sets `referral=<code>`, always overwriting the previous value.
pub fn set_referral(jar: CookieJar, referral_code: &str) -> CookieJar {
    jar.add(retained_cookie(REFERRAL_COOKIE, referral_code.to_string()))
}

/// Returns the visitor's id, generating and persisting one when the cookie is
/// absent or unreadable. An existing id is not re-issued, so its expiry is not
/// extended.
pub fn ensure_visitor_id(jar: CookieJar) -> (CookieJar, VisitorIdentity) {
    if let Some(visitor_id) = jar
        .get(VISITOR_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (
            jar,
            VisitorIdentity {
                visitor_id,
                is_new: false,
            },
        );
    }

    let visitor_id = Uuid::new_v4();
    let jar = jar.add(retained_cookie(VISITOR_COOKIE, visitor_id.to_string()));
    (
        jar,
        VisitorIdentity {
            visitor_id,
            is_new: true,
        },
    )
}
