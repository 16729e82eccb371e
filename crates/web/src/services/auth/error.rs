//! Authentication error types.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::services::forms::FormError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The submitted form was rejected before reaching the provider.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// The provider did not answer or answered with an error.
    #[error("auth provider error: {0}")]
    Provider(#[source] GatewayError),
}

impl AuthError {
    /// Message for the user, in the interface language.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Form(e) => e.message(),
            Self::InvalidCredentials => "Email ou senha inválidos".to_string(),
            Self::UserAlreadyExists => "Já existe uma conta com este email".to_string(),
            Self::Provider(e) => e.reason(),
        }
    }
}
