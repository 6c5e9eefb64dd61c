//! Outbound notifications.

use async_trait::async_trait;
use patisserie_core::{ChannelId, GuildId, MemberId};
use patisserie_error::PatisserieResult;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Staff channels the engine posts to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffChannel {
    /// Where cooks claim orders.
    Kitchen,
    /// Where deliverers pick up ready orders.
    Counter,
    /// Warnings, bans and unbans.
    Moderation,
    /// Customer ratings.
    Ratings,
    /// Customer complaints.
    Complaints,
    /// Weekly quota reports.
    Quota,
    /// Vacation requests.
    Vacation,
    /// Order backup log.
    Audit,
}

/// Destination of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    /// Direct message.
    Member(MemberId),
    /// A staff channel.
    Staff(StaffChannel),
    /// The channel an order was placed from.
    Origin {
        /// Community of the channel.
        guild_id: GuildId,
        /// The channel.
        channel_id: ChannelId,
    },
}

/// Asynchronous, best-effort message delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sends `message` to `to`.
    ///
    /// # Errors
    ///
    /// Returns a notify error when the transport fails. Callers log and
    /// continue.
    async fn notify(&self, to: &Recipient, message: &str) -> PatisserieResult<()>;
}

/// Sends and swallows failures after logging them.
///
/// Returns whether the message went out.
pub async fn notify_best_effort(sink: &dyn NotificationSink, to: &Recipient, message: &str) -> bool {
    match sink.notify(to, message).await {
        Ok(()) => true,
        Err(e) => {
            warn!(recipient = ?to, error = %e, "Notification failed");
            false
        }
    }
}
