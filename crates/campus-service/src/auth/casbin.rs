use std::sync::Arc;

use casbin::{CoreApi, MgmtApi};
use salvo::async_trait;

use campus_db::db::enums::Role;

use crate::error::{ServiceError, ServiceResult};

const ROLE_MODEL: &str = include_str!("casbin_model.conf");
const ROLE_POLICY: &str = include_str!("casbin_policy.csv");

/// ## Summary
/// Builds the role enforcer from the embedded model and policy.
///
/// Every account role must own at least one policy line; a role without
/// any would lock its users out of the whole API.
///
/// ## Errors
/// - `CasbinError` if the model or policy cannot be parsed.
/// - `InvariantViolation` if a role has no policy.
#[tracing::instrument]
pub async fn init_casbin() -> ServiceResult<casbin::Enforcer> {
    let model = casbin::DefaultModel::from_str(ROLE_MODEL).await?;
    let adapter = string_adapter::StringAdapter::new(ROLE_POLICY);
    let enforcer = casbin::Enforcer::new(model, adapter).await?;

    for role in [Role::Student, Role::Teacher, Role::Admin] {
        let rules = enforcer
            .get_filtered_policy(0, vec![role.casbin_subject()])
            .len();
        if rules == 0 {
            return Err(ServiceError::InvariantViolation(
                "embedded role policy misses an account role",
            ));
        }
        tracing::debug!(%role, rules, "Role policy loaded");
    }

    tracing::info!(
        policy_count = enforcer.get_policy().len(),
        "Role enforcer ready"
    );
    Ok(enforcer)
}

/// Hoop sharing the role enforcer with every request.
pub struct CasbinEnforcerHandler {
    pub enforcer: Arc<casbin::Enforcer>,
}

#[async_trait]
impl salvo::Handler for CasbinEnforcerHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.enforcer));
    }
}

/// ## Summary
/// Retrieves the Casbin enforcer from the depot.
///
/// ## Errors
/// Returns an error if the Casbin enforcer is not found in the depot.
pub fn get_enforcer_from_depot(depot: &salvo::Depot) -> ServiceResult<Arc<casbin::Enforcer>> {
    depot
        .obtain::<Arc<casbin::Enforcer>>()
        .cloned()
        .map_err(|_err| ServiceError::InvariantViolation("Casbin enforcer not found in depot"))
}
