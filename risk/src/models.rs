use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub saga_id: Uuid,
    pub user_id: String,
    pub risk_score: i32,
    pub approved: bool,
    pub fraud_check: bool,
    pub velocity_check: bool,
    pub blacklist_check: bool,
    pub rolled_back: bool,
    pub created_at: DateTime<Utc>,
}

/// Marker a user id must contain, case-insensitively, to be treated as
/// blacklisted. A stand-in for a real blocklist lookup.
const BLOCKLIST_MARKER: &str = "blocked";

pub struct Assessment {
    pub fraud_check: bool,
    pub velocity_check: bool,
    pub blacklist_check: bool,
    pub risk_score: i32,
    pub approved: bool,
}

/// Scores a saga against the three checks. `risk_score` is the weighted
/// sum kept for observability; `approved` requires every check to pass —
/// a partial score under any single failing check is still a decline.
pub fn assess(amount: f64, user_id: &str) -> Assessment {
    let fraud_check = amount <= 10_000.0;
    let velocity_check = true;
    let blacklist_check = !user_id.to_lowercase().contains(BLOCKLIST_MARKER);

    let risk_score = 40 * i32::from(!fraud_check) + 30 * i32::from(!velocity_check) + 30 * i32::from(!blacklist_check);
    let approved = fraud_check && velocity_check && blacklist_check;

    Assessment { fraud_check, velocity_check, blacklist_check, risk_score, approved }
}
