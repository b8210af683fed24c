//! Request plumbing shared by the route handlers.

use salvo::{Depot, Request};

use crate::error::{AppError, AppResult};
use campus_service::auth::{
    Action, AuthenticatedUser, Resource, authorizer_from_depot, get_user_from_depot,
};

/// ## Summary
/// The caller, as resolved by the authentication middleware.
///
/// ## Errors
/// Returns `NotAuthenticated` (401) for public requests.
pub fn current_user(depot: &Depot) -> AppResult<AuthenticatedUser> {
    Ok(get_user_from_depot(depot)?.clone())
}

/// ## Summary
/// The caller, once the role policy allows `action` on `resource`.
///
/// ## Errors
/// - 401 for public requests.
/// - 403 when the caller's role is not allowed.
pub fn authorize(depot: &Depot, resource: Resource, action: Action) -> AppResult<AuthenticatedUser> {
    let actor = current_user(depot)?;
    authorizer_from_depot(depot)?.require(actor.user.role, resource, action)?;
    Ok(actor)
}

/// ## Errors
/// Returns `BadRequest` when the path parameter is missing or not a UUID.
pub fn path_id(req: &Request, name: &str) -> AppResult<uuid::Uuid> {
    req.param::<uuid::Uuid>(name)
        .ok_or_else(|| AppError::BadRequest(format!("Identifiant invalide : {name}")))
}
