//! In-memory watermark and script stores.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use patisserie_core::MemberId;
use patisserie_error::PatisserieResult;
use patisserie_interface::{ScriptStore, WatermarkStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Single-slot watermark.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWatermarkStore {
    last_run: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl InMemoryWatermarkStore {
    /// Create an empty watermark.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatermarkStore for InMemoryWatermarkStore {
    async fn last_quota_run(&self) -> PatisserieResult<Option<DateTime<Utc>>> {
        Ok(*self.last_run.read().await)
    }

    async fn claim_quota_run(
        &self,
        now: DateTime<Utc>,
        min_gap: Duration,
    ) -> PatisserieResult<bool> {
        let mut last_run = self.last_run.write().await;
        if let Some(previous) = *last_run
            && now - previous < min_gap
        {
            return Ok(false);
        }
        *last_run = Some(now);
        Ok(true)
    }

    async fn release_quota_run(
        &self,
        claimed: DateTime<Utc>,
        previous: Option<DateTime<Utc>>,
    ) -> PatisserieResult<bool> {
        let mut last_run = self.last_run.write().await;
        if *last_run != Some(claimed) {
            return Ok(false);
        }
        *last_run = previous;
        Ok(true)
    }
}

/// Delivery scripts keyed by member.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScriptStore {
    scripts: Arc<RwLock<HashMap<MemberId, String>>>,
}

impl InMemoryScriptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScriptStore for InMemoryScriptStore {
    async fn script(&self, member: MemberId) -> PatisserieResult<Option<String>> {
        Ok(self.scripts.read().await.get(&member).cloned())
    }

    async fn set_script(&self, member: MemberId, script: &str) -> PatisserieResult<()> {
        self.scripts
            .write()
            .await
            .insert(member, script.to_string());
        Ok(())
    }
}
