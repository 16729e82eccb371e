//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{BackendKind, WebConfig};
use crate::gateway::{AuthProvider, Gateway, GatewayError, InMemoryBackend, SupabaseClient};
use crate::services::favorites::ToggleLocks;
use crate::services::uploads::{ImageUploader, InlineUploader};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Supabase backend selected but not configured")]
    MissingSupabaseConfig,
    #[error("backend client: {0}")]
    Client(#[from] GatewayError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    gateway: Arc<dyn Gateway>,
    auth: Arc<dyn AuthProvider>,
    uploader: Arc<dyn ImageUploader>,
    toggle_locks: ToggleLocks,
}

impl AppState {
    /// Build the state for the backend selected in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be created.
    pub fn new(config: WebConfig) -> Result<Self, StateError> {
        match config.backend {
            BackendKind::Supabase => {
                let supabase = config
                    .supabase
                    .as_ref()
                    .ok_or(StateError::MissingSupabaseConfig)?;
                let client = Arc::new(SupabaseClient::new(supabase)?);
                Ok(Self::with_backend(config, client.clone(), client))
            }
            BackendKind::Memory => {
                tracing::warn!("Using in-memory backend; data is lost on restart");
                let backend = Arc::new(InMemoryBackend::new());
                Ok(Self::with_backend(config, backend.clone(), backend))
            }
        }
    }

    /// Build the state around explicit backend implementations.
    #[must_use]
    pub fn with_backend(
        config: WebConfig,
        gateway: Arc<dyn Gateway>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                auth,
                uploader: Arc::new(InlineUploader),
                toggle_locks: ToggleLocks::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// The data gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn Gateway {
        self.inner.gateway.as_ref()
    }

    /// The authentication provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    #[must_use]
    pub fn uploader(&self) -> &dyn ImageUploader {
        self.inner.uploader.as_ref()
    }

    /// Locks serializing favorite toggles per (user, point).
    #[must_use]
    pub fn toggle_locks(&self) -> &ToggleLocks {
        &self.inner.toggle_locks
    }
}
