use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{ServiceError, ServiceResult};
use campus_core::constants::MIN_PASSWORD_LENGTH;

/// ## Summary
/// Hashes a password using Argon2id with a random salt.
///
/// ## Errors
/// Returns an error if password hashing fails.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Failed to hash password: {e}")))?;

    Ok(password_hash.to_string())
}

/// ## Summary
/// Verifies a password against a stored Argon2 hash.
///
/// ## Errors
/// Returns `NotAuthenticated` on mismatch, or `InvalidConfiguration` if the
/// stored hash cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<()> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Invalid password hash: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|err| {
            tracing::trace!("Password verification failed: {}", err);
            ServiceError::NotAuthenticated
        })
}

/// ## Summary
/// Rejects passwords shorter than the minimum length (counted in characters).
///
/// ## Errors
/// Returns `ValidationError` if the password is too short.
pub fn validate_new_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::ValidationError(format!(
            "Le mot de passe doit contenir au moins {MIN_PASSWORD_LENGTH} caractères"
        )));
    }
    Ok(())
}
