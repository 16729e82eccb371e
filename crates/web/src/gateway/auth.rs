//! Authentication provider interface.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use clique_recicle_core::{Email, UserId, UserRole};

use super::GatewayResult;

/// Bearer token issued by the auth provider for a signed-in user.
///
/// Kept in the session store so later writes can act on the user's behalf.
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Identity reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
    /// Role stored in the user's metadata at sign-up, if any.
    pub role_hint: Option<UserRole>,
}

/// A signed-in user and their access token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: AccessToken,
}

/// Sign-up request built by the registration form.
pub struct SignUp {
    pub name: String,
    pub email: Email,
    pub cpf: String,
    pub password: SecretString,
    pub role: UserRole,
}

impl std::fmt::Debug for SignUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUp")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SignUp {
    /// Password for the provider request body.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// Account created and signed in immediately.
    SignedIn(AuthSession),
    /// Account created; the provider wants the email confirmed first.
    ConfirmationRequired(AuthUser),
}

/// The external authentication service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account.
    async fn sign_up(&self, request: &SignUp) -> GatewayResult<SignUpOutcome>;

    /// Exchange email and password for a session.
    async fn sign_in(&self, email: &Email, password: &SecretString) -> GatewayResult<AuthSession>;

    /// Revoke an access token.
    async fn sign_out(&self, token: &AccessToken) -> GatewayResult<()>;
}
