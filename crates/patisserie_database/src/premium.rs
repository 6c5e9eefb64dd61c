//! PostgreSQL premium code and grant store.

use crate::connection::{PgPool, with_conn};
use crate::models::{PremiumCodeRow, PremiumGrantRow, member_key};
use crate::schema::{premium_codes, premium_grants};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use patisserie_core::{CodeStatus, MemberId, PremiumCode, PremiumGrant};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult, StoreError};
use patisserie_interface::PremiumStore;
use tracing::{debug, info, instrument};

/// Codes in `premium_codes`, grants in `premium_grants`.
#[derive(Debug, Clone)]
pub struct PostgresPremiumStore {
    pool: PgPool,
}

impl PostgresPremiumStore {
    /// Store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

enum Redemption {
    Redeemed(PremiumCode, PremiumGrant),
    Spent,
    Unknown,
}

#[async_trait]
impl PremiumStore for PostgresPremiumStore {
    #[instrument(skip(self, codes), fields(count = codes.len()))]
    async fn insert_codes(&self, codes: &[PremiumCode]) -> PatisserieResult<()> {
        let rows = codes
            .iter()
            .map(PremiumCodeRow::try_from)
            .collect::<Result<Vec<_>, StoreError>>()?;
        with_conn(&self.pool, move |conn| {
            diesel::insert_into(premium_codes::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        info!("Stored premium codes");
        Ok(())
    }

    #[instrument(skip(self, code), fields(member = %member))]
    async fn redeem(
        &self,
        code: &str,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<(PremiumCode, PremiumGrant)> {
        let key = code.to_string();
        let outcome = with_conn(&self.pool, move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                // The status filter makes the update one-shot.
                let redeemed = diesel::update(
                    premium_codes::table
                        .find(&key)
                        .filter(premium_codes::status.eq(CodeStatus::Unused.to_string())),
                )
                .set((
                    premium_codes::status.eq(CodeStatus::Redeemed.to_string()),
                    premium_codes::redeemed_by.eq(Some(member_key(member))),
                    premium_codes::redeemed_at.eq(Some(now)),
                ))
                .returning(PremiumCodeRow::as_returning())
                .get_result(conn)
                .optional()?;
                let Some(row) = redeemed else {
                    let known: i64 = premium_codes::table
                        .find(&key)
                        .count()
                        .get_result(conn)?;
                    return Ok(if known > 0 {
                        Redemption::Spent
                    } else {
                        Redemption::Unknown
                    });
                };

                let redeemed = PremiumCode::try_from(row)?;
                let previous = premium_grants::table
                    .find(member_key(member))
                    .select(PremiumGrantRow::as_select())
                    .for_update()
                    .first(conn)
                    .optional()?
                    .map(PremiumGrant::try_from)
                    .transpose()?;
                let grant =
                    PremiumGrant::after_redeeming(member, previous.as_ref(), &redeemed, now);
                let grant_row = PremiumGrantRow::from(&grant);
                diesel::insert_into(premium_grants::table)
                    .values(&grant_row)
                    .on_conflict(premium_grants::member_id)
                    .do_update()
                    .set(&grant_row)
                    .execute(conn)?;
                Ok(Redemption::Redeemed(redeemed, grant))
            })
        })
        .await?;

        match outcome {
            Redemption::Redeemed(code, grant) => {
                debug!("Redeemed premium code");
                Ok((code, grant))
            }
            Redemption::Spent => {
                Err(ActionError::new(ActionErrorKind::DuplicateRedemption(code.to_string())).into())
            }
            Redemption::Unknown => {
                Err(ActionError::new(ActionErrorKind::NotFound(format!("code {code}"))).into())
            }
        }
    }

    async fn grant(&self, member: MemberId) -> PatisserieResult<Option<PremiumGrant>> {
        let key = member_key(member);
        with_conn(&self.pool, move |conn| {
            premium_grants::table
                .find(key)
                .select(PremiumGrantRow::as_select())
                .first(conn)
                .optional()?
                .map(PremiumGrant::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self, grant), fields(member = %grant.member_id(), is_vip = grant.is_vip()))]
    async fn put_grant(&self, grant: &PremiumGrant) -> PatisserieResult<()> {
        let row = PremiumGrantRow::from(grant);
        with_conn(&self.pool, move |conn| {
            diesel::insert_into(premium_grants::table)
                .values(&row)
                .on_conflict(premium_grants::member_id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn lapsed_grants(&self, now: DateTime<Utc>) -> PatisserieResult<Vec<PremiumGrant>> {
        with_conn(&self.pool, move |conn| {
            premium_grants::table
                .filter(premium_grants::is_vip.eq(true))
                .filter(premium_grants::expires_at.lt(now))
                .select(PremiumGrantRow::as_select())
                .load(conn)?
                .into_iter()
                .map(PremiumGrant::try_from)
                .collect()
        })
        .await
    }

    #[instrument(skip(self), fields(member = %member))]
    async fn revoke_if_lapsed(
        &self,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<bool> {
        let revoked = PremiumGrantRow::from(&PremiumGrant::revoked(member));
        with_conn(&self.pool, move |conn| {
            let updated = diesel::update(
                premium_grants::table
                    .find(revoked.member_id)
                    .filter(premium_grants::is_vip.eq(true))
                    .filter(premium_grants::expires_at.lt(now)),
            )
            .set(&revoked)
            .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }
}
