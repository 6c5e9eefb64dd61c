//! Small single-purpose stores.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use patisserie_core::MemberId;
use patisserie_error::PatisserieResult;

/// Persisted time of the last weekly quota run.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Last recorded run.
    async fn last_quota_run(&self) -> PatisserieResult<Option<DateTime<Utc>>>;

    /// Records a run at `now` unless the previous one is less than
    /// `min_gap` old. Check and write are atomic.
    ///
    /// Returns whether the caller may proceed with the run.
    async fn claim_quota_run(&self, now: DateTime<Utc>, min_gap: Duration)
    -> PatisserieResult<bool>;

    /// Puts `previous` back if the stored run is still `claimed`.
    ///
    /// Undoes a claim whose run failed so a later check in the same window
    /// can retry. Returns whether the watermark was restored.
    async fn release_quota_run(
        &self,
        claimed: DateTime<Utc>,
        previous: Option<DateTime<Utc>>,
    ) -> PatisserieResult<bool>;
}

/// Custom delivery messages per deliverer.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// A deliverer's script.
    async fn script(&self, member: MemberId) -> PatisserieResult<Option<String>>;

    /// Inserts or replaces a deliverer's script.
    async fn set_script(&self, member: MemberId, script: &str) -> PatisserieResult<()>;
}
