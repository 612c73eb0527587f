use crate::error::OrderError;
use crate::handlers;
use crate::models::Order;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use saga_contracts::payloads::OrderItem;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub items: Vec<OrderItem>,
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = match &self {
            OrderError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderError::NotFound => StatusCode::NOT_FOUND,
            OrderError::Database(_) | OrderError::TerminalState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn validate_request(req: &InitiatePaymentRequest) -> Result<(), OrderError> {
    if req.amount <= 0.0 {
        return Err(OrderError::Validation("amount must be greater than zero".into()));
    }
    if req.currency.len() != 3 {
        return Err(OrderError::Validation("currency must be a 3-character ISO code".into()));
    }
    if req.items.is_empty() {
        return Err(OrderError::Validation("items must not be empty".into()));
    }
    for item in &req.items {
        if item.quantity == 0 {
            return Err(OrderError::Validation("item quantity must be greater than zero".into()));
        }
        if item.price < 0.0 {
            return Err(OrderError::Validation("item price must not be negative".into()));
        }
    }
    Ok(())
}

async fn initiate_payment(
    State(state): State<AppState>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<Json<Order>, OrderError> {
    validate_request(&req)?;

    let mut tx = state.pool.begin().await?;
    let order = handlers::initiate_payment(
        &mut tx,
        &req.user_id,
        req.amount,
        &req.currency,
        &req.payment_method,
        req.items,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(order))
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Order>, OrderError> {
    let user_id = headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .ok_or(OrderError::NotFound)?;

    let order = crate::db::find_by_id(&state.pool, order_id)
        .await?
        .filter(|order| order.user_id == user_id)
        .ok_or(OrderError::NotFound)?;

    Ok(Json(order))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "module": "order",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/orders/payment", axum::routing::post(initiate_payment))
        .route("/api/v1/orders/{order_id}", axum::routing::get(get_order))
        .route("/health", axum::routing::get(health))
        .with_state(state)
}
