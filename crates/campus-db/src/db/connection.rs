use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::db::DbProvider;
use crate::error::DbResult;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'pool> = PooledConnection<'pool, AsyncPgConnection>;

/// How long a request waits for a free connection before the pool reports
/// the database as unavailable.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// ## Summary
/// Creates the PostgreSQL connection pool.
///
/// Schedule batches fan out one insert per slot, each on its own pooled
/// connection, so `size` bounds how many of those run at once.
///
/// ## Errors
/// Returns an error if the pool cannot be created with the provided database URL.
#[tracing::instrument(skip(database_url), fields(pool_size = size))]
pub async fn create_pool(database_url: &str, size: u32) -> anyhow::Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(size.max(1))
        .min_idle(Some(1))
        .connection_timeout(CHECKOUT_TIMEOUT)
        .test_on_check_out(false)
        .build(manager)
        .await?;

    tracing::info!(pool_size = size, "Database pool ready");
    Ok(pool)
}

impl DbProvider for DbPool {
    fn get_connection<'a>(
        &'a self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DbResult<DbConnection<'a>>> + Send + 'a>>
    {
        Box::pin(async move {
            let conn = self.get().await.inspect_err(|err| {
                tracing::warn!(error = %err, "No database connection available");
            })?;
            Ok(conn)
        })
    }
}
