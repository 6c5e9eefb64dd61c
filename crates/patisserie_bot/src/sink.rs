//! Notification sink for runs without a chat platform.

use async_trait::async_trait;
use patisserie_error::PatisserieResult;
use patisserie_interface::{NotificationSink, Recipient};
use tracing::info;

/// Writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, to: &Recipient, message: &str) -> PatisserieResult<()> {
        info!(recipient = ?to, message, "Notification");
        Ok(())
    }
}
