//! Admin authentication.
//!
//! There is a single admin credential: an Argon2 PHC hash supplied through
//! configuration. Generate one with `gs-cli admin hash-password`.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Minimum length for a new admin password.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No admin password hash is configured.
    #[error("admin login is not configured")]
    NotConfigured,

    /// Password too weak to hash.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// Check a login attempt against the configured admin hash.
///
/// # Errors
///
/// Returns `AuthError::NotConfigured` if no hash is configured and
/// `AuthError::InvalidCredentials` if the password does not match.
pub fn verify_admin(hash: Option<&SecretString>, password: &str) -> Result<(), AuthError> {
    let hash = hash.ok_or(AuthError::NotConfigured)?;
    verify_password(password, hash.expose_secret())
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if validation fails and
/// `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// A malformed hash is treated as a mismatch.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
