//! PostgreSQL watermark and delivery script stores.

use crate::connection::{PgPool, with_conn};
use crate::models::member_key;
use crate::schema::{bot_settings, delivery_scripts};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use patisserie_core::MemberId;
use patisserie_error::{PatisserieResult, StoreError};
use patisserie_interface::{ScriptStore, WatermarkStore};
use tracing::{debug, instrument};

const LAST_QUOTA_RUN: &str = "last_quota_run";

/// Watermark row in `bot_settings`, seeded by the initial migration.
#[derive(Debug, Clone)]
pub struct PostgresWatermarkStore {
    pool: PgPool,
}

impl PostgresWatermarkStore {
    /// Store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatermarkStore for PostgresWatermarkStore {
    async fn last_quota_run(&self) -> PatisserieResult<Option<DateTime<Utc>>> {
        with_conn(&self.pool, move |conn| {
            let value = bot_settings::table
                .find(LAST_QUOTA_RUN)
                .select(bot_settings::value_at)
                .first::<Option<DateTime<Utc>>>(conn)
                .optional()?;
            Ok(value.flatten())
        })
        .await
    }

    #[instrument(skip(self), fields(now = %now))]
    async fn claim_quota_run(
        &self,
        now: DateTime<Utc>,
        min_gap: Duration,
    ) -> PatisserieResult<bool> {
        with_conn(&self.pool, move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                // Row lock serializes concurrent claimers.
                let previous = bot_settings::table
                    .find(LAST_QUOTA_RUN)
                    .select(bot_settings::value_at)
                    .for_update()
                    .first::<Option<DateTime<Utc>>>(conn)
                    .optional()?
                    .flatten();
                if let Some(previous) = previous
                    && now - previous < min_gap
                {
                    debug!(%previous, "Quota run already recorded");
                    return Ok(false);
                }

                diesel::insert_into(bot_settings::table)
                    .values((
                        bot_settings::key.eq(LAST_QUOTA_RUN),
                        bot_settings::value_at.eq(Some(now)),
                    ))
                    .on_conflict(bot_settings::key)
                    .do_update()
                    .set(bot_settings::value_at.eq(Some(now)))
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await
    }

    #[instrument(skip(self), fields(claimed = %claimed))]
    async fn release_quota_run(
        &self,
        claimed: DateTime<Utc>,
        previous: Option<DateTime<Utc>>,
    ) -> PatisserieResult<bool> {
        with_conn(&self.pool, move |conn| {
            let restored = diesel::update(
                bot_settings::table
                    .filter(bot_settings::key.eq(LAST_QUOTA_RUN))
                    .filter(bot_settings::value_at.eq(Some(claimed))),
            )
            .set(bot_settings::value_at.eq(previous))
            .execute(conn)?;
            debug!(restored, "Quota watermark release");
            Ok(restored == 1)
        })
        .await
    }
}

/// Scripts in `delivery_scripts`.
#[derive(Debug, Clone)]
pub struct PostgresScriptStore {
    pool: PgPool,
}

impl PostgresScriptStore {
    /// Store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScriptStore for PostgresScriptStore {
    async fn script(&self, member: MemberId) -> PatisserieResult<Option<String>> {
        let key = member_key(member);
        with_conn(&self.pool, move |conn| {
            Ok(delivery_scripts::table
                .find(key)
                .select(delivery_scripts::script)
                .first::<String>(conn)
                .optional()?)
        })
        .await
    }

    async fn set_script(&self, member: MemberId, script: &str) -> PatisserieResult<()> {
        let key = member_key(member);
        let script = script.to_string();
        with_conn(&self.pool, move |conn| {
            let now = Utc::now();
            diesel::insert_into(delivery_scripts::table)
                .values((
                    delivery_scripts::member_id.eq(key),
                    delivery_scripts::script.eq(&script),
                    delivery_scripts::updated_at.eq(now),
                ))
                .on_conflict(delivery_scripts::member_id)
                .do_update()
                .set((
                    delivery_scripts::script.eq(&script),
                    delivery_scripts::updated_at.eq(now),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
