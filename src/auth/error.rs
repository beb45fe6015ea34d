//! Authentication Errors

/// Errors raised while verifying credentials or issuing tokens
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password; deliberately does not say which
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid Authorization header format, expected: Bearer <token>")]
    MalformedHeader,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}
