//! Supabase client implementation.
//!
//! Talks to PostgREST (`/rest/v1`) for records and GoTrue (`/auth/v1`) for
//! authentication, using `reqwest` for HTTP. Collection point listings are
//! cached with `moka` (60-second TTL) and invalidated on every write made
//! through this client.

mod cache;
mod wire;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use clique_recicle_core::{
    CollectionPoint, CollectionPointId, Email, Favorite, FavoriteId, NewCollectionPoint, UserId,
    UserRole,
};

use crate::config::SupabaseConfig;

use super::{
    AccessToken, AuthProvider, AuthSession, Gateway, GatewayError, GatewayResult, PointFilter,
    SignUp, SignUpOutcome,
};
use cache::CacheKey;
use wire::{
    FavoriteInsert, GoTrueSession, PasswordGrantBody, RoleRow, SignUpBody, SignUpResponse,
    UserMetadata,
};

const POINTS_TABLE: &str = "collection_points";
const FAVORITES_TABLE: &str = "favorites";
const ROLES_TABLE: &str = "user_roles";

/// `select` clause that embeds the favorited point in each favorite row.
const FAVORITE_WITH_POINT: &str = "*,collection_points(*)";

const LISTING_TTL: Duration = Duration::from_secs(60);

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for a Supabase project.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    rest_endpoint: String,
    auth_endpoint: String,
    anon_key: SecretString,
    listings: Cache<CacheKey, Vec<CollectionPoint>>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let base = config.url.as_str().trim_end_matches('/');
        let listings = Cache::builder()
            .max_capacity(256)
            .time_to_live(LISTING_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                rest_endpoint: format!("{base}/rest/v1"),
                auth_endpoint: format!("{base}/auth/v1"),
                anon_key: config.anon_key.clone(),
                listings,
            }),
        })
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{table}", self.inner.rest_endpoint))
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{path}", self.inner.auth_endpoint))
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> GatewayResult<String> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = wire::error_message(&body)
            .unwrap_or_else(|| body.chars().take(200).collect::<String>());

        tracing::warn!(
            status = %status,
            message = %message,
            "Supabase returned non-success status"
        );

        Err(match status {
            StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => GatewayError::NotFound(message),
            StatusCode::CONFLICT => GatewayError::Conflict(message),
            _ if wire::is_unique_violation(&body) => GatewayError::Conflict(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GatewayError::Unauthorized(message)
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
                GatewayError::Unavailable(message)
            }
            _ => GatewayError::Backend {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send a request and parse a JSON response body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            GatewayError::Parse(e)
        })
    }

    /// Expect exactly one row back from a `return=representation` write.
    fn single_row<T>(rows: Vec<T>, what: impl FnOnce() -> String) -> GatewayResult<T> {
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(what()))
    }

    async fn invalidate_listings(&self) {
        self.inner.listings.invalidate_all();
        self.inner.listings.run_pending_tasks().await;
    }

    async fn find_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<Option<Favorite>> {
        let request = self
            .table(Method::GET, FAVORITES_TABLE)
            .bearer_auth(token.expose())
            .query(&[
                ("select", FAVORITE_WITH_POINT.to_string()),
                ("user_id", eq(user_id)),
                ("collection_point_id", eq(point_id)),
            ]);
        let rows: Vec<Favorite> = self.fetch(request).await?;
        Ok(rows.into_iter().next())
    }
}

/// PostgREST equality filter value.
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

// =============================================================================
// Gateway
// =============================================================================

#[async_trait]
impl Gateway for SupabaseClient {
    #[instrument(skip(self), fields(agent_id = ?filter.agent_id))]
    async fn list_collection_points(
        &self,
        filter: PointFilter,
    ) -> GatewayResult<Vec<CollectionPoint>> {
        let cache_key = CacheKey::from(filter);
        if let Some(points) = self.inner.listings.get(&cache_key).await {
            debug!("Cache hit for collection point listing");
            return Ok(points);
        }

        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(agent_id) = filter.agent_id {
            query.push(("agent_id", eq(agent_id)));
        }

        let points: Vec<CollectionPoint> = self
            .fetch(self.table(Method::GET, POINTS_TABLE).query(&query))
            .await?;

        self.inner.listings.insert(cache_key, points.clone()).await;
        Ok(points)
    }

    #[instrument(skip(self), fields(point_id = %id))]
    async fn get_collection_point(&self, id: CollectionPointId) -> GatewayResult<CollectionPoint> {
        let request = self
            .table(Method::GET, POINTS_TABLE)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<CollectionPoint> = self.fetch(request).await?;
        Self::single_row(rows, || format!("collection point {id}"))
    }

    #[instrument(skip(self, token, draft), fields(agent_id = %draft.agent_id))]
    async fn insert_collection_point(
        &self,
        token: &AccessToken,
        draft: &NewCollectionPoint,
    ) -> GatewayResult<CollectionPoint> {
        let request = self
            .table(Method::POST, POINTS_TABLE)
            .bearer_auth(token.expose())
            .header("Prefer", "return=representation")
            .json(draft);
        let rows: Vec<CollectionPoint> = self.fetch(request).await?;
        self.invalidate_listings().await;
        Self::single_row(rows, || "inserted collection point".to_string())
    }

    #[instrument(skip(self, token, draft), fields(point_id = %id))]
    async fn update_collection_point(
        &self,
        token: &AccessToken,
        id: CollectionPointId,
        draft: &NewCollectionPoint,
    ) -> GatewayResult<CollectionPoint> {
        let request = self
            .table(Method::PATCH, POINTS_TABLE)
            .bearer_auth(token.expose())
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id))])
            .json(draft);
        let rows: Vec<CollectionPoint> = self.fetch(request).await?;
        self.invalidate_listings().await;
        Self::single_row(rows, || format!("collection point {id}"))
    }

    #[instrument(skip(self, token), fields(point_id = %id))]
    async fn delete_collection_point(
        &self,
        token: &AccessToken,
        id: CollectionPointId,
    ) -> GatewayResult<()> {
        let request = self
            .table(Method::DELETE, POINTS_TABLE)
            .bearer_auth(token.expose())
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id))]);
        let rows: Vec<CollectionPoint> = self.fetch(request).await?;
        self.invalidate_listings().await;
        // Row level security hides other agents' rows, so nothing deleted means
        // missing or not ours.
        Self::single_row(rows, || format!("collection point {id}")).map(|_| ())
    }

    #[instrument(skip(self, token), fields(user_id = %user_id))]
    async fn list_favorites(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> GatewayResult<Vec<Favorite>> {
        let request = self
            .table(Method::GET, FAVORITES_TABLE)
            .bearer_auth(token.expose())
            .query(&[
                ("select", FAVORITE_WITH_POINT.to_string()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.fetch(request).await
    }

    #[instrument(skip(self, token), fields(user_id = %user_id, point_id = %point_id))]
    async fn insert_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<Favorite> {
        let request = self
            .table(Method::POST, FAVORITES_TABLE)
            .bearer_auth(token.expose())
            .header("Prefer", "return=representation,resolution=ignore-duplicates")
            .query(&[
                ("on_conflict", "user_id,collection_point_id".to_string()),
                ("select", FAVORITE_WITH_POINT.to_string()),
            ])
            .json(&FavoriteInsert {
                user_id,
                collection_point_id: point_id,
            });
        let rows: Vec<Favorite> = self.fetch(request).await?;

        if let Some(favorite) = rows.into_iter().next() {
            return Ok(favorite);
        }

        // Duplicate ignored: the pair already exists, return that row.
        debug!("Favorite already present, fetching existing row");
        self.find_favorite(token, user_id, point_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("favorite for point {point_id}")))
    }

    #[instrument(skip(self, token), fields(user_id = %user_id, point_id = %point_id))]
    async fn delete_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<()> {
        let request = self
            .table(Method::DELETE, FAVORITES_TABLE)
            .bearer_auth(token.expose())
            .query(&[
                ("user_id", eq(user_id)),
                ("collection_point_id", eq(point_id)),
            ]);
        self.send(request).await.map(|_| ())
    }

    #[instrument(skip(self, token), fields(favorite_id = %favorite_id))]
    async fn delete_favorite_by_id(
        &self,
        token: &AccessToken,
        favorite_id: FavoriteId,
    ) -> GatewayResult<()> {
        let request = self
            .table(Method::DELETE, FAVORITES_TABLE)
            .bearer_auth(token.expose())
            .query(&[("id", eq(favorite_id))]);
        self.send(request).await.map(|_| ())
    }

    #[instrument(skip(self, token), fields(user_id = %user_id))]
    async fn fetch_role(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> GatewayResult<Option<UserRole>> {
        let request = self
            .table(Method::GET, ROLES_TABLE)
            .bearer_auth(token.expose())
            .query(&[("select", "role".to_string()), ("user_id", eq(user_id))]);
        let rows: Vec<RoleRow> = self.fetch(request).await?;
        Ok(rows.into_iter().find_map(|row| row.role.parse().ok()))
    }
}

// =============================================================================
// AuthProvider
// =============================================================================

fn session_from(raw: GoTrueSession) -> GatewayResult<AuthSession> {
    let user = raw
        .user
        .into_auth_user()
        .ok_or_else(|| GatewayError::Unauthorized("account has no usable email".to_string()))?;
    Ok(AuthSession {
        user,
        access_token: AccessToken::new(raw.access_token),
    })
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    async fn sign_up(&self, request: &SignUp) -> GatewayResult<SignUpOutcome> {
        let body = SignUpBody {
            email: request.email.as_str(),
            password: request.password(),
            data: UserMetadata {
                name: Some(request.name.clone()),
                cpf: Some(request.cpf.clone()),
                user_type: Some(request.role.to_string()),
            },
        };
        let response: SignUpResponse = self
            .fetch(self.auth(Method::POST, "signup").json(&body))
            .await?;

        match response {
            SignUpResponse::Session(raw) => session_from(raw).map(SignUpOutcome::SignedIn),
            SignUpResponse::User(raw) => raw
                .into_auth_user()
                .map(SignUpOutcome::ConfirmationRequired)
                .ok_or_else(|| {
                    GatewayError::Unauthorized("account has no usable email".to_string())
                }),
        }
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &SecretString) -> GatewayResult<AuthSession> {
        let body = PasswordGrantBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let request = self
            .auth(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&body);

        match self.fetch::<GoTrueSession>(request).await {
            Ok(raw) => session_from(raw),
            // GoTrue answers bad credentials with 400 invalid_grant
            Err(GatewayError::Backend { status: 400, message }) => {
                Err(GatewayError::Unauthorized(message))
            }
            Err(other) => Err(other),
        }
    }

    #[instrument(skip(self, token))]
    async fn sign_out(&self, token: &AccessToken) -> GatewayResult<()> {
        let request = self
            .auth(Method::POST, "logout")
            .bearer_auth(token.expose());
        self.send(request).await.map(|_| ())
    }
}
