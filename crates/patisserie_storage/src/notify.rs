//! Recording notification sink.

use async_trait::async_trait;
use patisserie_error::{NotifyError, NotifyErrorKind, PatisserieResult};
use patisserie_interface::{NotificationSink, Recipient};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every delivered message; can be told to fail for chosen recipients.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<RwLock<Vec<(Recipient, String)>>>,
    unreachable: Arc<RwLock<HashSet<Recipient>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes later sends to `recipient` fail.
    pub async fn fail_for(&self, recipient: Recipient) {
        self.unreachable.write().await.insert(recipient);
    }

    /// Every delivered message, in send order.
    pub async fn sent(&self) -> Vec<(Recipient, String)> {
        self.sent.read().await.clone()
    }

    /// Messages delivered to `recipient`.
    pub async fn sent_to(&self, recipient: &Recipient) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, to: &Recipient, message: &str) -> PatisserieResult<()> {
        if self.unreachable.read().await.contains(to) {
            return Err(NotifyError::new(NotifyErrorKind::Unreachable(format!("{to:?}"))).into());
        }
        self.sent.write().await.push((*to, message.to_string()));
        Ok(())
    }
}
