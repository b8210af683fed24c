//! Role-based authorization backed by Casbin.

use std::fmt;
use std::sync::Arc;

use casbin::CoreApi;

use crate::error::{ServiceError, ServiceResult};
use campus_db::db::enums::Role;

/// Resource families named in the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Students,
    Formations,
    Courses,
    Modules,
    Schedule,
    Documents,
    Notifications,
}

impl Resource {
    #[must_use]
    pub const fn as_casbin_object(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Students => "students",
            Self::Formations => "formations",
            Self::Courses => "courses",
            Self::Modules => "modules",
            Self::Schedule => "schedule",
            Self::Documents => "documents",
            Self::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_casbin_object())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn as_casbin_action(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_casbin_action())
    }
}

/// Authorization service for checking role permissions.
pub struct Authorizer {
    enforcer: Arc<casbin::Enforcer>,
}

impl Authorizer {
    #[must_use]
    pub fn new(enforcer: Arc<casbin::Enforcer>) -> Self {
        Self { enforcer }
    }

    /// ## Summary
    /// Returns whether `role` may perform `action` on `resource`.
    ///
    /// ## Errors
    /// Returns `CasbinError` if Casbin evaluation fails.
    pub fn check(&self, role: Role, resource: Resource, action: Action) -> ServiceResult<bool> {
        let sub = role.casbin_subject();
        let obj = resource.as_casbin_object();
        let act = action.as_casbin_action();

        let allowed = self
            .enforcer
            .enforce((sub.as_str(), obj, act))
            .map_err(ServiceError::CasbinError)?;

        tracing::trace!(
            subject = %sub,
            object = %obj,
            action = %act,
            allowed = %allowed,
            "Authorization check"
        );
        Ok(allowed)
    }

    /// ## Summary
    /// Check and require permission.
    ///
    /// ## Errors
    /// - Returns `AuthorizationError` if access is denied.
    /// - Returns `CasbinError` if Casbin evaluation fails.
    pub fn require(&self, role: Role, resource: Resource, action: Action) -> ServiceResult<()> {
        if self.check(role, resource, action)? {
            Ok(())
        } else {
            tracing::debug!(%role, %resource, %action, "Authorization denied");
            Err(ServiceError::AuthorizationError(format!(
                "Access denied: {action} on {resource}"
            )))
        }
    }
}

/// ## Summary
/// Create an authorizer from the depot.
///
/// ## Errors
/// Returns `InvariantViolation` if the Casbin enforcer is not in the depot.
pub fn authorizer_from_depot(depot: &salvo::Depot) -> ServiceResult<Authorizer> {
    let enforcer = super::casbin::get_enforcer_from_depot(depot)?;
    Ok(Authorizer::new(enforcer))
}
