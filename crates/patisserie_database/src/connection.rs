//! Connection pool, migrations and the blocking-call bridge.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use patisserie_error::{PatisserieResult, StoreError, StoreErrorKind};
use tracing::{debug, info, instrument};

/// Shared r2d2 pool of PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds a pool and checks out one connection to prove the URL works.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), patisserie_error::StoreError> {
/// let pool = patisserie_database::connect_pool("postgres://localhost/patisserie", 10)?;
/// patisserie_database::run_migrations(&pool)?;
/// # Ok(())
/// # }
/// ```
#[instrument(skip(database_url))]
pub fn connect_pool(database_url: &str, pool_size: u32) -> Result<PgPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))?;

    // Warm up the pool
    let _conn = pool.get()?;
    info!(pool_size, "Database pool ready");
    Ok(pool)
}

/// Applies every embedded migration not yet recorded in the database.
pub fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::new(StoreErrorKind::Migration(e.to_string())))?;
    info!(count = applied.len(), "Applied pending migrations");
    Ok(())
}

/// Runs `work` on a pooled connection inside the blocking thread pool.
pub(crate) async fn with_conn<T, F>(pool: &PgPool, work: F) -> PatisserieResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
{
    let pool = pool.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        work(&mut conn)
    })
    .await
    .map_err(|e| {
        debug!(error = %e, "Blocking database task did not complete");
        StoreError::new(StoreErrorKind::Join(e.to_string()))
    })?;
    Ok(result?)
}
