//! PostgreSQL activity ledger.
//!
//! Every mutation is one upsert or one update, so counters stay correct with
//! many writers and no explicit locking.

use crate::connection::{PgPool, with_conn};
use crate::models::{ActivityRow, member_key};
use crate::schema::staff_activity::{self, dsl};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use patisserie_core::{MemberId, RoleGroup, StaffActivityRecord};
use patisserie_error::{PatisserieResult, StoreError, StoreErrorKind};
use patisserie_interface::ActivityLedger;
use tracing::{debug, instrument};

/// Activity records in `staff_activity`.
#[derive(Debug, Clone)]
pub struct PostgresActivityLedger {
    pool: PgPool,
}

impl PostgresActivityLedger {
    /// Ledger on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLedger for PostgresActivityLedger {
    async fn get(&self, member: MemberId) -> PatisserieResult<Option<StaffActivityRecord>> {
        let key = member_key(member);
        with_conn(&self.pool, move |conn| {
            staff_activity::table
                .find(key)
                .select(ActivityRow::as_select())
                .first(conn)
                .optional()?
                .map(StaffActivityRecord::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self), fields(member = %member, group = %group))]
    async fn increment(&self, member: MemberId, group: RoleGroup) -> PatisserieResult<()> {
        with_conn(&self.pool, move |conn| {
            let mut fresh = ActivityRow::empty(member);
            match group {
                RoleGroup::Cook => {
                    fresh.cook_count_week = 1;
                    fresh.cook_count_total = 1;
                    diesel::insert_into(staff_activity::table)
                        .values(&fresh)
                        .on_conflict(dsl::member_id)
                        .do_update()
                        .set((
                            dsl::cook_count_week.eq(dsl::cook_count_week + 1),
                            dsl::cook_count_total.eq(dsl::cook_count_total + 1),
                        ))
                        .execute(conn)?;
                }
                RoleGroup::Delivery => {
                    fresh.deliver_count_week = 1;
                    fresh.deliver_count_total = 1;
                    diesel::insert_into(staff_activity::table)
                        .values(&fresh)
                        .on_conflict(dsl::member_id)
                        .do_update()
                        .set((
                            dsl::deliver_count_week.eq(dsl::deliver_count_week + 1),
                            dsl::deliver_count_total.eq(dsl::deliver_count_total + 1),
                        ))
                        .execute(conn)?;
                }
            }
            debug!("Incremented activity counters");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(member = %member))]
    async fn add_warning(&self, member: MemberId) -> PatisserieResult<u32> {
        let total = with_conn(&self.pool, move |conn| {
            let mut fresh = ActivityRow::empty(member);
            fresh.warnings = 1;
            let total: i32 = diesel::insert_into(staff_activity::table)
                .values(&fresh)
                .on_conflict(dsl::member_id)
                .do_update()
                .set(dsl::warnings.eq(dsl::warnings + 1))
                .returning(dsl::warnings)
                .get_result(conn)?;
            u32::try_from(total)
                .map_err(|_| StoreError::new(StoreErrorKind::Corrupt(format!("warnings {total}"))))
        })
        .await?;
        debug!(total, "Recorded warning");
        Ok(total)
    }

    #[instrument(skip(self), fields(member = %member, until = %until))]
    async fn suspend_until(
        &self,
        member: MemberId,
        until: DateTime<Utc>,
    ) -> PatisserieResult<()> {
        with_conn(&self.pool, move |conn| {
            let mut fresh = ActivityRow::empty(member);
            fresh.ban_expires_at = Some(until);
            diesel::insert_into(staff_activity::table)
                .values(&fresh)
                .on_conflict(dsl::member_id)
                .do_update()
                .set(dsl::ban_expires_at.eq(Some(until)))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(member = %member))]
    async fn ban(&self, member: MemberId) -> PatisserieResult<()> {
        with_conn(&self.pool, move |conn| {
            let mut fresh = ActivityRow::empty(member);
            fresh.is_banned = true;
            diesel::insert_into(staff_activity::table)
                .values(&fresh)
                .on_conflict(dsl::member_id)
                .do_update()
                .set(dsl::is_banned.eq(true))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(member = %member))]
    async fn lift_ban(&self, member: MemberId) -> PatisserieResult<()> {
        let key = member_key(member);
        with_conn(&self.pool, move |conn| {
            diesel::update(staff_activity::table.find(key))
                .set((
                    dsl::is_banned.eq(false),
                    dsl::ban_expires_at.eq(None::<DateTime<Utc>>),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn clear_lapsed_suspension(
        &self,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<bool> {
        let key = member_key(member);
        with_conn(&self.pool, move |conn| {
            let cleared = diesel::update(
                staff_activity::table
                    .find(key)
                    .filter(dsl::ban_expires_at.le(now)),
            )
            .set(dsl::ban_expires_at.eq(None::<DateTime<Utc>>))
            .execute(conn)?;
            Ok(cleared > 0)
        })
        .await
    }

    #[instrument(skip(self), fields(member = %member, group = %group))]
    async fn close_week(
        &self,
        member: MemberId,
        group: RoleGroup,
        quota_fails: u32,
    ) -> PatisserieResult<()> {
        let fails = i32::try_from(quota_fails).map_err(|_| {
            StoreError::new(StoreErrorKind::Corrupt(format!("quota fails {quota_fails}")))
        })?;
        with_conn(&self.pool, move |conn| {
            let mut fresh = ActivityRow::empty(member);
            match group {
                RoleGroup::Cook => {
                    fresh.quota_fails_cook = fails;
                    diesel::insert_into(staff_activity::table)
                        .values(&fresh)
                        .on_conflict(dsl::member_id)
                        .do_update()
                        .set((dsl::cook_count_week.eq(0), dsl::quota_fails_cook.eq(fails)))
                        .execute(conn)?;
                }
                RoleGroup::Delivery => {
                    fresh.quota_fails_deliver = fails;
                    diesel::insert_into(staff_activity::table)
                        .values(&fresh)
                        .on_conflict(dsl::member_id)
                        .do_update()
                        .set((
                            dsl::deliver_count_week.eq(0),
                            dsl::quota_fails_deliver.eq(fails),
                        ))
                        .execute(conn)?;
                }
            }
            Ok(())
        })
        .await
    }
}
