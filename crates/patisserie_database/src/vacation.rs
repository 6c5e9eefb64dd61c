//! PostgreSQL vacation store.

use crate::connection::{PgPool, with_conn};
use crate::models::{VacationRow, member_key};
use crate::schema::vacation_requests::{self, dsl};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use patisserie_core::{MemberId, VacationRequest, VacationStatus};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
use patisserie_interface::VacationStore;
use tracing::{debug, instrument};

/// Latest request per member in `vacation_requests`.
#[derive(Debug, Clone)]
pub struct PostgresVacationStore {
    pool: PgPool,
}

impl PostgresVacationStore {
    /// Store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VacationStore for PostgresVacationStore {
    async fn get(&self, member: MemberId) -> PatisserieResult<Option<VacationRequest>> {
        let key = member_key(member);
        with_conn(&self.pool, move |conn| {
            vacation_requests::table
                .find(key)
                .select(VacationRow::as_select())
                .first(conn)
                .optional()?
                .map(VacationRequest::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self, request), fields(member = %request.staff_id(), days = request.days()))]
    async fn submit(&self, request: &VacationRequest) -> PatisserieResult<()> {
        let row = VacationRow::try_from(request)?;
        let finished = [
            VacationStatus::Expired.to_string(),
            VacationStatus::Denied.to_string(),
        ];

        let stored = with_conn(&self.pool, move |conn| {
            // A finished request is replaced in place; a missing one is inserted.
            let replaced = diesel::update(
                vacation_requests::table
                    .find(row.staff_id)
                    .filter(dsl::status.eq_any(finished)),
            )
            .set(&row)
            .execute(conn)?;
            if replaced > 0 {
                return Ok(true);
            }

            match diesel::insert_into(vacation_requests::table)
                .values(&row)
                .execute(conn)
            {
                Ok(_) => Ok(true),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await?;

        if stored {
            debug!("Stored vacation request");
            Ok(())
        } else {
            Err(ActionError::new(ActionErrorKind::AlreadyActive(
                "a vacation request is already open".to_string(),
            ))
            .into())
        }
    }

    #[instrument(skip(self, next), fields(member = %next.staff_id(), expected = %expected))]
    async fn update_if_status(
        &self,
        expected: VacationStatus,
        next: &VacationRequest,
    ) -> PatisserieResult<bool> {
        let row = VacationRow::try_from(next)?;
        let expected = expected.to_string();
        with_conn(&self.pool, move |conn| {
            let updated = diesel::update(
                vacation_requests::table
                    .find(row.staff_id)
                    .filter(dsl::status.eq(expected)),
            )
            .set(&row)
            .execute(conn)?;
            Ok(updated == 1)
        })
        .await
    }

    async fn list_by_status(
        &self,
        status: VacationStatus,
    ) -> PatisserieResult<Vec<VacationRequest>> {
        let status = status.to_string();
        with_conn(&self.pool, move |conn| {
            vacation_requests::table
                .filter(dsl::status.eq(status))
                .select(VacationRow::as_select())
                .load(conn)?
                .into_iter()
                .map(VacationRequest::try_from)
                .collect()
        })
        .await
    }
}
