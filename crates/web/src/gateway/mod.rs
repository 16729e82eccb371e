//! Data access gateway to the hosted backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local persistence, direct API calls
//! - [`Gateway`] covers collection points, favorites and user roles
//! - [`AuthProvider`] covers sign-up, sign-in and sign-out
//! - [`SupabaseClient`] implements both against PostgREST and GoTrue
//! - [`InMemoryBackend`] implements both in process (development and tests)
//!
//! No logic lives here beyond request shaping; filtering, pagination and
//! favorites bookkeeping happen in [`crate::services`].
//!
//! # Example
//!
//! ```rust,ignore
//! use clique_recicle_web::gateway::{Gateway, PointFilter, SupabaseClient};
//!
//! let client = SupabaseClient::new(&supabase_config)?;
//! let mine = client.list_collection_points(PointFilter::by_agent(agent_id)).await?;
//! ```

mod auth;
mod memory;
mod supabase;

pub use auth::{AccessToken, AuthProvider, AuthSession, AuthUser, SignUp, SignUpOutcome};
pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;

use async_trait::async_trait;
use thiserror::Error;

use clique_recicle_core::{
    CollectionPoint, CollectionPointId, Favorite, FavoriteId, NewCollectionPoint, UserId,
    UserRole,
};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend error ({status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested record does not exist (or is not visible to the caller).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credentials or access token were rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// The reason to show the user, as reported by the backend when it gave one.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Backend { message, .. }
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unauthorized(message)
            | Self::Unavailable(message) => message.clone(),
            Self::RateLimited(secs) => format!("Muitas requisições, tente em {secs}s"),
            Self::Http(_) | Self::Parse(_) => "Falha de comunicação com o servidor".to_string(),
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Filter for collection point listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PointFilter {
    /// Only points owned by this agent.
    pub agent_id: Option<UserId>,
}

impl PointFilter {
    /// Every collection point.
    #[must_use]
    pub const fn all() -> Self {
        Self { agent_id: None }
    }

    /// Points owned by one agent (the dashboard listing).
    #[must_use]
    pub const fn by_agent(agent_id: UserId) -> Self {
        Self {
            agent_id: Some(agent_id),
        }
    }
}

/// Record operations against the hosted backend.
///
/// Writes carry the caller's [`AccessToken`] so the backend can enforce row
/// ownership; reads of collection points are public.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// List collection points, newest first.
    async fn list_collection_points(
        &self,
        filter: PointFilter,
    ) -> GatewayResult<Vec<CollectionPoint>>;

    /// Fetch one collection point.
    async fn get_collection_point(&self, id: CollectionPointId) -> GatewayResult<CollectionPoint>;

    /// Insert a collection point and return the stored row.
    async fn insert_collection_point(
        &self,
        token: &AccessToken,
        draft: &NewCollectionPoint,
    ) -> GatewayResult<CollectionPoint>;

    /// Replace the editable fields of a collection point.
    async fn update_collection_point(
        &self,
        token: &AccessToken,
        id: CollectionPointId,
        draft: &NewCollectionPoint,
    ) -> GatewayResult<CollectionPoint>;

    /// Delete a collection point.
    async fn delete_collection_point(
        &self,
        token: &AccessToken,
        id: CollectionPointId,
    ) -> GatewayResult<()>;

    /// List a user's favorites joined with their collection points.
    async fn list_favorites(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> GatewayResult<Vec<Favorite>>;

    /// Insert a favorite; inserting an existing pair returns the existing row.
    async fn insert_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<Favorite>;

    /// Delete the favorite for a (user, point) pair; deleting a missing pair is not an error.
    async fn delete_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<()>;

    /// Delete a favorite by its own id.
    async fn delete_favorite_by_id(
        &self,
        token: &AccessToken,
        favorite_id: FavoriteId,
    ) -> GatewayResult<()>;

    /// Look up the role record for a user, if one exists.
    async fn fetch_role(&self, token: &AccessToken, user_id: UserId)
    -> GatewayResult<Option<UserRole>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::NotFound("collection point 42".to_string());
        assert_eq!(err.to_string(), "Not found: collection point 42");

        let err = GatewayError::Backend {
            status: 400,
            message: "invalid input syntax for type uuid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend error (400): invalid input syntax for type uuid"
        );
    }

    #[test]
    fn test_reason_surfaces_backend_message() {
        let err = GatewayError::Conflict("duplicate key value".to_string());
        assert_eq!(err.reason(), "duplicate key value");
        assert_eq!(
            GatewayError::RateLimited(30).reason(),
            "Muitas requisições, tente em 30s"
        );
    }

    #[test]
    fn test_point_filter_constructors() {
        let agent = UserId::generate();
        assert_eq!(PointFilter::all().agent_id, None);
        assert_eq!(PointFilter::by_agent(agent).agent_id, Some(agent));
    }
}
