use async_trait::async_trait;

#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn send(&self, channel: &str, message: &str) -> Result<(), String>;
}

/// Always succeeds, logging the simulated send. Grounded on the same
/// mock email/SMS shape the teacher's notifications handler uses, plus a
/// short simulated latency.
pub struct MockNotificationAdapter;

impl MockNotificationAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockNotificationAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationAdapter for MockNotificationAdapter {
    async fn send(&self, channel: &str, message: &str) -> Result<(), String> {
        tracing::info!(channel, message, "mock: sending notification");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_adapter_always_succeeds() {
        let adapter = MockNotificationAdapter::new();
        assert!(adapter.send("email", "hello").await.is_ok());
    }
}
