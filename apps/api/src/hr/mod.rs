// Recruiting: job postings, applications and interview scheduling.
// HR-only routes are gated by the `HrAccess` extractor.

pub mod access;
pub mod handlers;
