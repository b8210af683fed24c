use salvo::Depot;
use salvo::http::StatusCode;
use tracing::error;

use crate::db_handler::get_db_from_depot;
use campus_service::auth::authenticate::authenticate;
use campus_service::auth::depot::{DepotUser, depot_keys};
use campus_service::error::ServiceError;

/// ## Summary
/// Resolves the bearer token of a request and stores who made it in the
/// depot. Requests without a token, or with an unknown or expired one, are
/// stored as public; handlers that need a user reject them with 401.
///
/// ## Errors
/// Responds 500 if the database provider is missing and 503 if no
/// connection can be obtained.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authenticating request");

        if req.method() == salvo::http::Method::OPTIONS
            || !req.headers().contains_key(salvo::http::header::AUTHORIZATION)
        {
            depot.insert(depot_keys::AUTHENTICATED_PRINCIPAL, DepotUser::Public);
            return;
        }

        let provider = match get_db_from_depot(depot) {
            Ok(p) => p,
            Err(e) => {
                error!(error = ?e, "Failed to get database provider from depot");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        let mut conn = match provider.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!(error = ?e, "Failed to get database connection");
                res.status_code(StatusCode::SERVICE_UNAVAILABLE);
                ctrl.skip_rest();
                return;
            }
        };

        match authenticate(req, &mut conn).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.user.id, role = %user.user.role, "User authenticated");
                depot.insert(
                    depot_keys::AUTHENTICATED_PRINCIPAL,
                    DepotUser::User(Box::new(user)),
                );
            }
            Err(ServiceError::NotAuthenticated) => {
                tracing::debug!("Bearer token rejected, treating request as public");
                depot.insert(depot_keys::AUTHENTICATED_PRINCIPAL, DepotUser::Public);
            }
            Err(service_err) => {
                error!(error = ?service_err, "Authentication failed with error");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                res.body("Internal Server Error");
                ctrl.skip_rest();
            }
        }
    }
}

/// ## Summary
/// Middleware handler for authentication.
pub struct AuthMiddleware;
