use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ChargeResult {
    pub gateway_transaction_id: String,
    pub auth_code: String,
}

#[derive(Debug, Clone)]
pub struct RefundResult {
    pub refund_id: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, amount: f64, currency: &str) -> Result<ChargeResult, String>;
    async fn refund(&self, gateway_transaction_id: &str, amount: f64) -> Result<RefundResult, String>;
}

/// Mock payment processor for development and testing.
///
/// In production this would be replaced with actual processor
/// integrations. It always succeeds and returns synthetic identifiers.
/// The amount threshold that declines a charge is Risk's concern, not
/// this gateway's — by the time Payment calls `charge`, Risk has already
/// approved the saga.
pub struct MockPaymentProcessor;

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockPaymentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentProcessor {
    async fn charge(&self, amount: f64, currency: &str) -> Result<ChargeResult, String> {
        tracing::info!(amount, currency, "processing mock charge");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok(ChargeResult {
            gateway_transaction_id: format!("mock_pi_{}", Uuid::new_v4().simple()),
            auth_code: format!("auth_{}", Uuid::new_v4().simple()).chars().take(12).collect(),
        })
    }

    async fn refund(&self, gateway_transaction_id: &str, amount: f64) -> Result<RefundResult, String> {
        tracing::info!(gateway_transaction_id, amount, "processing mock refund");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok(RefundResult { refund_id: format!("mock_re_{}", Uuid::new_v4().simple()) })
    }
}

/// Test double that fails its first `n` charge attempts, then succeeds —
/// used to drive the gateway-retry path deterministically in tests
/// without making the production mock gateway flaky.
pub struct FailNTimes {
    remaining: std::sync::atomic::AtomicU32,
}

impl FailNTimes {
    pub fn new(n: u32) -> Self {
        Self { remaining: std::sync::atomic::AtomicU32::new(n) }
    }
}

#[async_trait]
impl PaymentGateway for FailNTimes {
    async fn charge(&self, _amount: f64, _currency: &str) -> Result<ChargeResult, String> {
        use std::sync::atomic::Ordering;
        if self.remaining.load(Ordering::SeqCst) > 0 {
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            return Err("gateway declined".to_string());
        }
        Ok(ChargeResult {
            gateway_transaction_id: "retry_ok".to_string(),
            auth_code: "auth_retry".to_string(),
        })
    }

    async fn refund(&self, _gateway_transaction_id: &str, _amount: f64) -> Result<RefundResult, String> {
        use std::sync::atomic::Ordering;
        if self.remaining.load(Ordering::SeqCst) > 0 {
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            return Err("gateway declined".to_string());
        }
        Ok(RefundResult { refund_id: "retry_refund_ok".to_string() })
    }
}
