use crate::db;
use crate::error::RiskError;
use crate::models::assess;
use saga_contracts::payloads::{RiskCheckCompleted, RiskCheckRollback, RiskChecks};
use saga_contracts::runtime::outbox;
use saga_contracts::{EventEnvelope, EventType};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Scores the saga and persists the assessment. The weighted `risk_score`
/// is carried for observability only — `approved` requires every check
/// to pass.
pub async fn handle_payment_initiated(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    order_id: Uuid,
    user_id: &str,
    amount: f64,
) -> Result<(), RiskError> {
    if db::find_by_saga_id(tx, saga_id).await?.is_some() {
        return Ok(());
    }

    let scored = assess(amount, user_id);
    let id = Uuid::new_v4();

    db::insert(
        tx,
        id,
        order_id,
        saga_id,
        user_id,
        scored.risk_score,
        scored.approved,
        scored.fraud_check,
        scored.velocity_check,
        scored.blacklist_check,
    )
    .await?;

    let envelope = EventEnvelope::new(
        EventType::RiskCheckCompleted,
        saga_id,
        "risk",
        RiskCheckCompleted {
            order_id,
            risk_score: scored.risk_score as u32,
            approved: scored.approved,
            checks: RiskChecks {
                fraud_check: scored.fraud_check,
                velocity_check: scored.velocity_check,
                blacklist_check: scored.blacklist_check,
            },
        },
    );

    outbox::enqueue(
        tx,
        envelope.event_id,
        EventType::RiskCheckCompleted.topic().as_str(),
        saga_id,
        &serde_json::to_value(&envelope).unwrap(),
    )
    .await?;

    Ok(())
}

/// Rolls back a previously completed assessment on saga compensation.
/// A missing assessment (compensation racing ahead of the forward step)
/// or one already rolled back is a no-op — idempotent by construction.
pub async fn handle_compensation(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    order_id: Uuid,
    reason: String,
) -> Result<(), RiskError> {
    let Some(assessment) = db::find_by_saga_id(tx, saga_id).await? else {
        return Ok(());
    };

    if assessment.rolled_back {
        return Ok(());
    }

    db::set_rolled_back(tx, assessment.id).await?;

    let envelope = EventEnvelope::new(
        EventType::RiskCheckRollback,
        saga_id,
        "risk",
        RiskCheckRollback { order_id, reason },
    );

    outbox::enqueue(
        tx,
        envelope.event_id,
        EventType::RiskCheckRollback.topic().as_str(),
        saga_id,
        &serde_json::to_value(&envelope).unwrap(),
    )
    .await?;

    Ok(())
}
