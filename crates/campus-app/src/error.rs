use salvo::http::StatusCode;
use salvo::writing::{Json, Writer};
use salvo::{Depot, Request, Response, async_trait};
use serde::Serialize;
use thiserror::Error;

use campus_core::error::CoreError;
use campus_db::error::DbError;
use campus_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<salvo::http::ParseError> for AppError {
    fn from(err: salvo::http::ParseError) -> Self {
        Self::BadRequest(format!("Requête invalide : {err}"))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

const INTERNAL_MESSAGE: &str = "Erreur interne du serveur";
const UNAVAILABLE_MESSAGE: &str = "Base de données indisponible";

fn db_status(err: &DbError) -> StatusCode {
    match err {
        DbError::PoolError(_) => StatusCode::SERVICE_UNAVAILABLE,
        DbError::DatabaseError(_) | DbError::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// ## Summary
    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(err) => match err {
                ServiceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                ServiceError::AuthorizationError(_) => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::ValidationError(_)
                | ServiceError::CoreError(CoreError::InvalidInput(_)) => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                ServiceError::DatabaseError(db) => db_status(db),
                ServiceError::CasbinError(_)
                | ServiceError::CoreError(_)
                | ServiceError::InvalidConfiguration(_)
                | ServiceError::InvariantViolation(_)
                | ServiceError::DieselError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::DatabaseError(db) => db_status(db),
            Self::CoreError(CoreError::InvalidInput(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CoreError(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// ## Summary
    /// Message shown to the client. Server-side failures are not described.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_MESSAGE.to_string(),
            StatusCode::SERVICE_UNAVAILABLE => UNAVAILABLE_MESSAGE.to_string(),
            StatusCode::UNAUTHORIZED => "Authentification requise".to_string(),
            _ => match self {
                Self::ServiceError(
                    ServiceError::AuthorizationError(msg)
                    | ServiceError::NotFound(msg)
                    | ServiceError::ValidationError(msg)
                    | ServiceError::Conflict(msg)
                    | ServiceError::PayloadTooLarge(msg),
                )
                | Self::BadRequest(msg) => msg.clone(),
                other => other.to_string(),
            },
        }
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, path = %req.uri().path(), "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }
        res.status_code(status);
        res.render(Json(ErrorResponse {
            error: self.public_message(),
        }));
    }
}
