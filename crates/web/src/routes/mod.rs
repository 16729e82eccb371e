//! HTTP route handlers.
//!
//! Every view is served as a JSON view model for the front end to render.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                          - Home page
//! GET    /sobre                     - About page
//! GET    /dicas                     - Recycling tips
//!
//! # Collection points
//! GET    /locais?q=&page=           - Search and paginate collection points
//! POST   /locais/{id}/favorito      - Toggle favorite
//!
//! # Agent onboarding
//! GET    /agent-onboarding          - Form defaults and material options
//! POST   /agent-onboarding          - Register the agent's collection point
//!
//! # Auth (rate limited)
//! POST   /login                     - Sign in
//! POST   /cadastro                  - Register
//! POST   /logout                    - Sign out
//!
//! # Dashboard (requires auth)
//! GET    /dashboard                 - Own points (agents) and favorites
//! POST   /dashboard/pontos          - Create collection point
//! PUT    /dashboard/pontos/{id}     - Update collection point
//! DELETE /dashboard/pontos/{id}     - Delete collection point
//! DELETE /dashboard/favoritos/{id}  - Remove favorite
//!
//! GET    /health, /health/ready     - Liveness and readiness
//! ```

pub mod auth;
pub mod dashboard;
pub mod onboarding;
pub mod pages;
pub mod points;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::{Serialize, de::DeserializeOwned};
use tower_http::trace::TraceLayer;
use tower_sessions::Session;

use crate::error::AppError;
use crate::gateway::PointFilter;
use crate::middleware::{auth_rate_limiter, create_session_layer};
use crate::models::{Notice, SessionContext, session_keys};
use crate::services::favorites::{FavoriteSet, FavoritesController, LOAD_FAILED};
use crate::state::AppState;

/// Sign-in and sign-up, behind the auth rate limiter.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/cadastro", post(auth::register))
        .route_layer(auth_rate_limiter())
}

/// Collection point list and favorites toggle.
pub fn point_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(points::index))
        .route("/{id}/favorito", post(points::toggle_favorite))
}

/// Agent dashboard.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::show))
        .route("/pontos", post(dashboard::create_point))
        .route(
            "/pontos/{id}",
            put(dashboard::update_point).delete(dashboard::delete_point),
        )
        .route("/favoritos/{id}", delete(dashboard::remove_favorite))
}

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/sobre", get(pages::about))
        .route("/dicas", get(pages::tips))
        .nest("/locais", point_routes())
        .route(
            "/agent-onboarding",
            get(onboarding::form)
                .post(onboarding::submit)
                .layer(DefaultBodyLimit::max(onboarding::BODY_LIMIT)),
        )
        .merge(auth_routes())
        .route("/logout", post(auth::logout))
        .nest("/dashboard", dashboard_routes())
}

/// The complete application: routes, health checks, sessions and tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .fallback(not_found)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend cannot list collection points.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state
        .gateway()
        .list_collection_points(PointFilter::all())
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Página não encontrada".to_string())
}

/// Read a value from the session, treating unreadable data as absent.
async fn session_get<T: DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    match session.get::<T>(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable session value");
            None
        }
    }
}

async fn session_put<T: Serialize + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    session.insert(key, value).await.map_err(AppError::from)
}

/// The signed-in user's favorites: from the session, or fetched and cached
/// there on first use. A failed fetch yields an empty set and a notice.
async fn session_favorites(
    state: &AppState,
    session: &Session,
    ctx: &SessionContext,
) -> Result<(FavoriteSet, Option<Notice>), AppError> {
    if !ctx.is_authenticated() {
        return Ok((FavoriteSet::default(), None));
    }
    if let Some(set) = session_get::<FavoriteSet>(session, session_keys::FAVORITES).await {
        return Ok((set, None));
    }

    let mut set = FavoriteSet::default();
    let controller = FavoritesController::new(state.gateway(), state.toggle_locks());
    if controller.load(ctx, &mut set).await.is_err() {
        return Ok((set, Some(Notice::error(LOAD_FAILED))));
    }
    session_put(session, session_keys::FAVORITES, &set).await?;
    Ok((set, None))
}
