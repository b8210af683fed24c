//! Depot helpers for the authenticated user of a request.

use campus_db::model::user::User;

use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const AUTHENTICATED_PRINCIPAL: &str = "__authenticated_principal";
}

/// A user authenticated through one of their sessions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session_id: uuid::Uuid,
}

/// Who the authentication middleware resolved the request to.
#[derive(Debug, Clone)]
pub enum DepotUser {
    User(Box<AuthenticatedUser>),
    Public,
}

/// Get the authenticated user from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if no user is found in the depot or if the user is public.
pub fn get_user_from_depot(depot: &salvo::Depot) -> ServiceResult<&AuthenticatedUser> {
    let depot_user = depot
        .get::<DepotUser>(depot_keys::AUTHENTICATED_PRINCIPAL)
        .map_err(|_e| ServiceError::NotAuthenticated)?;

    match depot_user {
        DepotUser::User(user) => Ok(user),
        DepotUser::Public => Err(ServiceError::NotAuthenticated),
    }
}

/// Check if the request is from an authenticated user (not public).
#[must_use]
pub fn is_authenticated(depot: &salvo::Depot) -> bool {
    depot
        .get::<DepotUser>(depot_keys::AUTHENTICATED_PRINCIPAL)
        .is_ok_and(|u| matches!(u, DepotUser::User(_)))
}
