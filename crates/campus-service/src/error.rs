use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    DatabaseError(#[from] campus_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] campus_core::error::CoreError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),
}

impl ServiceError {
    /// ## Summary
    /// Maps unique-constraint violations to `Conflict` with the given message
    /// and passes every other error through.
    #[must_use]
    pub fn conflict_on_unique(self, message: &str) -> Self {
        let unique = match &self {
            Self::DieselError(diesel::result::Error::DatabaseError(kind, _)) => {
                matches!(kind, diesel::result::DatabaseErrorKind::UniqueViolation)
            }
            Self::DatabaseError(db) => db.is_unique_violation(),
            _ => false,
        };
        if unique {
            Self::Conflict(message.to_string())
        } else {
            self
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
