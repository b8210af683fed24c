use crate::error::DbResult;
use std::future::Future;
use std::pin::Pin;

pub mod connection;
pub mod enums;
pub mod migrations;
pub mod query;
pub mod schema;

/// Source of pooled connections, shared with handlers through the depot.
///
/// Schedule batches take one connection per inserted slot, so services that
/// fan out receive the provider itself rather than a single connection.
pub trait DbProvider: Send + Sync {
    fn get_connection<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = DbResult<connection::DbConnection<'a>>> + Send + 'a>>;
}
