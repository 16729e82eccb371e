//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-class errors are
//! captured to Sentry before the response is built; the body never carries
//! internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::Notice;
use crate::services::auth::AuthError;
use crate::services::favorites::FavoritesError;
use crate::services::forms::FormError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The action needs a signed-in user.
    #[error("Authentication required")]
    AuthRequired,

    /// Signed in but not allowed (not the owner, not an agent).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected; the message is meant for the user.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backend rejected or failed a write.
    #[error("Remote write failed: {source}")]
    RemoteWrite {
        /// What to tell the user.
        message: String,
        #[source]
        source: GatewayError,
    },

    /// The backend failed a read.
    #[error("Remote read failed: {source}")]
    RemoteRead {
        /// What to tell the user.
        message: String,
        #[source]
        source: GatewayError,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many requests.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A failed write with the user-facing text to show for it.
    #[must_use]
    pub fn remote_write(message: impl Into<String>, source: GatewayError) -> Self {
        match source {
            GatewayError::RateLimited(_) => Self::RateLimited,
            source => Self::RemoteWrite {
                message: message.into(),
                source,
            },
        }
    }

    /// A failed read with the user-facing text to show for it.
    #[must_use]
    pub fn remote_read(message: impl Into<String>, source: GatewayError) -> Self {
        Self::RemoteRead {
            message: message.into(),
            source,
        }
    }

    /// Convert a form failure, using `write_failed` as the text for
    /// rejected writes.
    #[must_use]
    pub fn from_form(err: FormError, write_failed: &str) -> Self {
        let message = err.message();
        match err {
            FormError::AuthRequired => Self::AuthRequired,
            FormError::Forbidden(_) => Self::Forbidden(message),
            FormError::NotFound(_) => Self::NotFound(message),
            FormError::RemoteWrite(source) => Self::remote_write(write_failed, source),
            FormError::RemoteRead(source) => Self::remote_read(message, source),
            FormError::Invalid(_)
            | FormError::Draft(_)
            | FormError::Email(_)
            | FormError::TooManyImages { .. }
            | FormError::Upload(_) => Self::Validation(message),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RemoteWrite { .. } | Self::RemoteRead { .. } => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Você precisa estar logado".to_string(),
            Self::Forbidden(message) | Self::Validation(message) | Self::NotFound(message) => {
                message.clone()
            }
            Self::RemoteWrite { message, .. } | Self::RemoteRead { message, .. } => {
                message.clone()
            }
            Self::RateLimited => "Muitas tentativas, aguarde um momento".to_string(),
            // Don't expose internal error details to clients
            Self::Internal(_) => "Erro interno do servidor".to_string(),
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        Self::from_form(err, "Não foi possível salvar")
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Form(form) => form.into(),
            AuthError::InvalidCredentials | AuthError::UserAlreadyExists => {
                Self::Validation(err.message())
            }
            AuthError::Provider(GatewayError::RateLimited(_)) => Self::RateLimited,
            AuthError::Provider(source) => Self::remote_write(source.reason(), source),
        }
    }
}

impl From<FavoritesError> for AppError {
    fn from(err: FavoritesError) -> Self {
        match err {
            FavoritesError::AuthRequired => Self::AuthRequired,
            FavoritesError::RemoteWrite(source) => {
                Self::remote_write(crate::services::favorites::TOGGLE_FAILED, source)
            }
            FavoritesError::RemoteRead(source) => {
                Self::remote_read(crate::services::favorites::LOAD_FAILED, source)
            }
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: Notice,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Internal(_) | Self::RemoteWrite { .. } | Self::RemoteRead { .. }
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: Notice::error(self.user_message()),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(AppError::AuthRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::Validation("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_of(AppError::Internal("db".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("session store exploded".to_string());
        assert_eq!(err.user_message(), "Erro interno do servidor");
    }

    #[test]
    fn test_form_write_failure_uses_given_text() {
        let err = AppError::from_form(
            FormError::RemoteWrite(GatewayError::Unavailable("timeout".to_string())),
            "Erro ao cadastrar ponto de coleta",
        );
        assert_eq!(err.user_message(), "Erro ao cadastrar ponto de coleta");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_favorites_auth_required() {
        let err: AppError = FavoritesError::AuthRequired.into();
        assert!(matches!(err, AppError::AuthRequired));
    }
}
