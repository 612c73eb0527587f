use crate::models::RiskAssessment;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    order_id: Uuid,
    saga_id: Uuid,
    user_id: &str,
    risk_score: i32,
    approved: bool,
    fraud_check: bool,
    velocity_check: bool,
    blacklist_check: bool,
) -> Result<RiskAssessment, sqlx::Error> {
    sqlx::query_as::<_, RiskAssessment>(
        r#"
        INSERT INTO risk_assessments
            (id, order_id, saga_id, user_id, risk_score, approved, fraud_check, velocity_check, blacklist_check, rolled_back, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, NOW())
        RETURNING id, order_id, saga_id, user_id, risk_score, approved, fraud_check, velocity_check, blacklist_check, rolled_back, created_at
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(saga_id)
    .bind(user_id)
    .bind(risk_score)
    .bind(approved)
    .bind(fraud_check)
    .bind(velocity_check)
    .bind(blacklist_check)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_saga_id(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
) -> Result<Option<RiskAssessment>, sqlx::Error> {
    sqlx::query_as::<_, RiskAssessment>(
        r#"
        SELECT id, order_id, saga_id, user_id, risk_score, approved, fraud_check, velocity_check, blacklist_check, rolled_back, created_at
        FROM risk_assessments
        WHERE saga_id = $1
        FOR UPDATE
        "#,
    )
    .bind(saga_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn set_rolled_back(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE risk_assessments SET rolled_back = TRUE WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
