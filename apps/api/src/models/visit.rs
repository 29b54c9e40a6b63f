use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored at `visitors/{referral_code}/{visitor_id}`. One document per pair;
/// a repeat visit overwrites `timestamp` (last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub timestamp: DateTime<Utc>,
}
