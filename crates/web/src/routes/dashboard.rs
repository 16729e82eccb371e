//! Dashboard handlers: an agent's own points and everyone's favorites.
//!
//! Every write is followed by a fresh read of the list it changed.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use clique_recicle_core::{CollectionPoint, CollectionPointId, Favorite, FavoriteId};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::UserView;
use super::session_put;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Notice, SessionContext, session_keys};
use crate::services::catalog::LOAD_FAILED as POINTS_LOAD_FAILED;
use crate::services::favorites::{
    FavoriteSet, FavoritesController, FavoritesError, LOAD_FAILED as FAVORITES_LOAD_FAILED,
    REMOVE_FAILED, REMOVED,
};
use crate::services::forms::{
    CREATE_FAILED, CREATED, CollectionPointForm, DELETE_FAILED, DELETED, PointEditor,
    UPDATE_FAILED, UPDATED,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub user: UserView,
    pub is_agent: bool,
    /// The agent's own points, newest first. Empty for recyclers.
    pub points: Vec<CollectionPoint>,
    pub favorites: Vec<Favorite>,
    pub notices: Vec<Notice>,
}

/// Response to a collection point write.
#[derive(Debug, Serialize)]
pub struct PointsUpdate {
    pub notice: Notice,
    /// The written point; absent after a delete.
    pub point: Option<CollectionPoint>,
    pub points: Vec<CollectionPoint>,
    /// Set when the list could not be re-read.
    pub reload_notice: Option<Notice>,
}

/// Response to removing a favorite.
#[derive(Debug, Serialize)]
pub struct FavoritesUpdate {
    pub notice: Notice,
    pub favorites: Vec<Favorite>,
    pub reload_notice: Option<Notice>,
}

// =============================================================================
// Helpers
// =============================================================================

/// The agent's points, or an empty list and a notice if the read failed.
async fn my_points(state: &AppState, ctx: &SessionContext) -> (Vec<CollectionPoint>, Option<Notice>) {
    match PointEditor::new(state.gateway()).list_mine(ctx).await {
        Ok(points) => (points, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load agent points");
            (Vec::new(), Some(Notice::error(POINTS_LOAD_FAILED)))
        }
    }
}

/// Read the agent's points again after `point` was written.
async fn after_write(
    state: &AppState,
    ctx: &SessionContext,
    message: &str,
    point: Option<CollectionPoint>,
) -> PointsUpdate {
    let (points, reload_notice) = my_points(state, ctx).await;
    PointsUpdate {
        notice: Notice::success(message),
        point,
        points,
        reload_notice,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /dashboard`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DashboardPage>, AppError> {
    let view = UserView::from(&user);
    let is_agent = user.is_agent();
    let ctx = SessionContext::signed_in(user);
    let mut notices = Vec::new();

    let points = if is_agent {
        let (points, notice) = my_points(&state, &ctx).await;
        notices.extend(notice);
        points
    } else {
        Vec::new()
    };

    let mut favorites = FavoriteSet::default();
    let controller = FavoritesController::new(state.gateway(), state.toggle_locks());
    match controller.load(&ctx, &mut favorites).await {
        Ok(_) => session_put(&session, session_keys::FAVORITES, &favorites).await?,
        Err(_) => notices.push(Notice::error(FAVORITES_LOAD_FAILED)),
    }

    Ok(Json(DashboardPage {
        user: view,
        is_agent,
        points,
        favorites: favorites.entries().to_vec(),
        notices,
    }))
}

/// `POST /dashboard/pontos`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_point(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<CollectionPointForm>,
) -> Result<(StatusCode, Json<PointsUpdate>), AppError> {
    let ctx = SessionContext::signed_in(user);
    let point = PointEditor::new(state.gateway())
        .create(&ctx, &form)
        .await
        .map_err(|e| AppError::from_form(e, CREATE_FAILED))?;

    let update = after_write(&state, &ctx, CREATED, Some(point)).await;
    Ok((StatusCode::CREATED, Json(update)))
}

/// `PUT /dashboard/pontos/{id}`
#[instrument(skip_all, fields(user_id = %user.id, point_id = %id))]
pub async fn update_point(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CollectionPointId>,
    Json(form): Json<CollectionPointForm>,
) -> Result<Json<PointsUpdate>, AppError> {
    let ctx = SessionContext::signed_in(user);
    let point = PointEditor::new(state.gateway())
        .update(&ctx, id, &form)
        .await
        .map_err(|e| AppError::from_form(e, UPDATE_FAILED))?;

    Ok(Json(after_write(&state, &ctx, UPDATED, Some(point)).await))
}

/// `DELETE /dashboard/pontos/{id}`
///
/// Favorites pointing at the point go with it.
#[instrument(skip_all, fields(user_id = %user.id, point_id = %id))]
pub async fn delete_point(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CollectionPointId>,
) -> Result<Json<PointsUpdate>, AppError> {
    let ctx = SessionContext::signed_in(user);
    PointEditor::new(state.gateway())
        .delete(&ctx, id)
        .await
        .map_err(|e| AppError::from_form(e, DELETE_FAILED))?;

    // The cached favorites may still name the deleted point.
    session
        .remove::<serde_json::Value>(session_keys::FAVORITES)
        .await?;

    Ok(Json(after_write(&state, &ctx, DELETED, None).await))
}

/// `DELETE /dashboard/favoritos/{id}`
#[instrument(skip_all, fields(user_id = %user.id, %favorite_id))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(favorite_id): Path<FavoriteId>,
) -> Result<Json<FavoritesUpdate>, AppError> {
    let ctx = SessionContext::signed_in(user);
    let mut favorites = FavoriteSet::default();
    let controller = FavoritesController::new(state.gateway(), state.toggle_locks());

    let reload_notice = match controller.remove(&ctx, &mut favorites, favorite_id).await {
        Ok(()) => {
            session_put(&session, session_keys::FAVORITES, &favorites).await?;
            None
        }
        Err(FavoritesError::RemoteRead(_)) => {
            // Deleted, but the list could not be re-read; drop the stale copy.
            session
                .remove::<serde_json::Value>(session_keys::FAVORITES)
                .await?;
            Some(Notice::error(FAVORITES_LOAD_FAILED))
        }
        Err(FavoritesError::RemoteWrite(source)) => {
            return Err(AppError::remote_write(REMOVE_FAILED, source));
        }
        Err(FavoritesError::AuthRequired) => return Err(AppError::AuthRequired),
    };

    Ok(Json(FavoritesUpdate {
        notice: Notice::success(REMOVED),
        favorites: favorites.entries().to_vec(),
        reload_notice,
    }))
}
