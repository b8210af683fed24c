mod auth;
mod courses;
mod documents;
mod extract;
mod formations;
mod healthcheck;
mod notifications;
mod schedule;
mod students;
mod users;

use salvo::Router;

use crate::middleware::auth::AuthMiddleware;

pub use campus_core::constants::{API_ROUTE_COMPONENT, API_ROUTE_PREFIX};

/// ## Summary
/// Constructs the API router. Every route sits behind the authentication
/// middleware; handlers that need a user reject public requests.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .hoop(AuthMiddleware)
        .push(healthcheck::routes())
        .push(auth::routes())
        .push(users::routes())
        .push(students::routes())
        .push(formations::routes())
        .push(courses::routes())
        .push(schedule::routes())
        .push(documents::routes())
        .push(notifications::routes())
}
