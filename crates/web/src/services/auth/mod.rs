//! Authentication service.
//!
//! Sign-in, registration and sign-out against the [`AuthProvider`], plus
//! resolving the user's role from the `user_roles` record.

mod error;

pub use error::AuthError;

use tracing::instrument;

use clique_recicle_core::{Email, UserRole};

use crate::gateway::{AuthProvider, AuthSession, Gateway, GatewayError, SignUpOutcome};
use crate::models::CurrentUser;
use crate::services::forms::{LoginForm, RegistrationForm};

/// Where agents go after signing up.
pub const AGENT_LANDING: &str = "/agent-onboarding";
/// Where everybody else goes after signing up or in.
pub const DEFAULT_LANDING: &str = "/";

/// Result of a registration.
#[derive(Debug, Clone)]
pub enum Registration {
    /// Signed in straight away.
    SignedIn {
        user: CurrentUser,
        redirect_to: &'static str,
    },
    /// The provider sent a confirmation email first.
    ConfirmationRequired { email: Email },
}

/// Authentication service.
pub struct AuthService<'a> {
    provider: &'a dyn AuthProvider,
    gateway: &'a dyn Gateway,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(provider: &'a dyn AuthProvider, gateway: &'a dyn Gateway) -> Self {
        Self { provider, gateway }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// `Form` for blank or malformed fields, `InvalidCredentials` when the
    /// provider refuses them, `Provider` for anything else.
    #[instrument(skip_all, fields(email = %form.email.trim()))]
    pub async fn sign_in(&self, form: &LoginForm) -> Result<CurrentUser, AuthError> {
        let (email, password) = form.validate()?;
        let session = self
            .provider
            .sign_in(&email, &password)
            .await
            .map_err(|e| match e {
                GatewayError::Unauthorized(_) => AuthError::InvalidCredentials,
                other => AuthError::Provider(other),
            })?;

        let role = self.resolve_role(&session).await;
        tracing::info!(user_id = %session.user.id, %role, "User signed in");
        Ok(CurrentUser::from_auth(session, role))
    }

    /// Create an account with one sign-up call carrying name, CPF and role.
    ///
    /// # Errors
    ///
    /// `Form` for invalid fields, `UserAlreadyExists` for a taken email,
    /// `Provider` for anything else.
    #[instrument(skip_all, fields(email = %form.email.trim(), role = %form.user_type))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<Registration, AuthError> {
        let request = form.validate()?;
        let outcome = self.provider.sign_up(&request).await.map_err(|e| match e {
            GatewayError::Conflict(_) => AuthError::UserAlreadyExists,
            GatewayError::Backend { status: 422, ref message }
                if message.contains("already registered") =>
            {
                AuthError::UserAlreadyExists
            }
            other => AuthError::Provider(other),
        })?;

        match outcome {
            SignUpOutcome::SignedIn(session) => {
                let role = session.user.role_hint.unwrap_or(request.role);
                tracing::info!(user_id = %session.user.id, %role, "User registered");
                let redirect_to = if role.is_agent() {
                    AGENT_LANDING
                } else {
                    DEFAULT_LANDING
                };
                Ok(Registration::SignedIn {
                    user: CurrentUser::from_auth(session, role),
                    redirect_to,
                })
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!(user_id = %user.id, "User registered, confirmation pending");
                Ok(Registration::ConfirmationRequired { email: user.email })
            }
        }
    }

    /// Revoke the user's token. Failure is logged; the local session is
    /// cleared by the caller regardless.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn sign_out(&self, user: &CurrentUser) {
        if let Err(e) = self.provider.sign_out(&user.access_token).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
    }

    /// The `user_roles` record wins, then the sign-up metadata, then recycler.
    async fn resolve_role(&self, session: &AuthSession) -> UserRole {
        match self
            .gateway
            .fetch_role(&session.access_token, session.user.id)
            .await
        {
            Ok(Some(role)) => role,
            Ok(None) => session.user.role_hint.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Role lookup failed, using sign-up metadata");
                session.user.role_hint.unwrap_or_default()
            }
        }
    }
}
