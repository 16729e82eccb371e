//! Collection point list and favorites toggle handlers.
//!
//! Search text and page live in the session, so a new query keeps the page
//! the visitor was on and every read clamps it into range.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use clique_recicle_core::{CollectionPoint, CollectionPointId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::{session_favorites, session_get, session_put};
use crate::error::AppError;
use crate::gateway::PointFilter;
use crate::middleware::OptionalAuth;
use crate::models::{Notice, session_keys};
use crate::services::catalog::{CatalogState, ListController};
use crate::services::favorites::FavoritesController;
use crate::state::AppState;

/// Query string of `GET /locais`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// New search text; absent keeps the stored one.
    pub q: Option<String>,
    /// Page to jump to; absent keeps the stored one.
    pub page: Option<usize>,
}

/// One card in the list.
#[derive(Debug, Serialize)]
pub struct PointCard {
    #[serde(flatten)]
    pub point: CollectionPoint,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub show: bool,
    pub has_previous: bool,
    pub has_next: bool,
}

/// The collection points page.
#[derive(Debug, Serialize)]
pub struct PointsPage {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub search_placeholder: &'static str,
    pub map_placeholder: [&'static str; 2],
    pub query: String,
    pub heading: String,
    pub materials_label: &'static str,
    pub cards: Vec<PointCard>,
    /// Set when the search matched nothing.
    pub empty_message: Option<&'static str>,
    pub pager: Pager,
    pub signed_in: bool,
    pub notices: Vec<Notice>,
}

const EMPTY_SEARCH: &str = "Nenhum ponto de coleta encontrado para sua busca.";

// =============================================================================
// Handlers
// =============================================================================

/// `GET /locais?q=&page=`
#[instrument(skip_all, fields(q = ?params.q, page = ?params.page))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(ctx): OptionalAuth,
    Query(params): Query<ListQuery>,
) -> Result<Json<PointsPage>, AppError> {
    let saved = session_get::<CatalogState>(&session, session_keys::CATALOG)
        .await
        .unwrap_or_default();
    let mut list = ListController::with_state(saved, state.config().catalog.page_size);

    if let Some(q) = params.q {
        list.set_query(q);
    }

    let ticket = list.begin_fetch();
    let result = state
        .gateway()
        .list_collection_points(PointFilter::all())
        .await;
    list.complete_fetch(ticket, result);

    if let Some(page) = params.page {
        list.go_to(page);
    }
    session_put(&session, session_keys::CATALOG, list.state()).await?;

    let (favorites, favorites_notice) = session_favorites(&state, &session, &ctx).await?;
    let notices = list
        .notice()
        .cloned()
        .into_iter()
        .chain(favorites_notice)
        .collect();

    let filtered_count = list.filtered().len();
    let cards = list
        .current_items()
        .into_iter()
        .map(|point| PointCard {
            is_favorite: favorites.contains(point.id),
            point: point.clone(),
        })
        .collect();

    Ok(Json(PointsPage {
        title: "LOCAIS DE COLETA",
        subtitle: "Encontre pontos de coleta próximos a você e comece a reciclar hoje mesmo",
        search_placeholder: "Buscar por localização, material ou nome do ponto...",
        map_placeholder: [
            "Mapa interativo dos pontos de coleta",
            "(Funcionalidade será implementada em breve)",
        ],
        query: list.query().to_string(),
        heading: format!("Pontos de Coleta Disponíveis ({filtered_count})"),
        materials_label: "Materiais aceitos:",
        cards,
        empty_message: (filtered_count == 0).then_some(EMPTY_SEARCH),
        pager: Pager {
            page: list.current_page(),
            total_pages: list.total_pages(),
            show: list.show_pager(),
            has_previous: list.has_previous(),
            has_next: list.has_next(),
        },
        signed_in: ctx.is_authenticated(),
        notices,
    }))
}

/// Result of a favorite toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub point_id: CollectionPointId,
    pub is_favorite: bool,
    pub favorites: usize,
}

/// `POST /locais/{id}/favorito`
///
/// Signed out, responds 401 without touching the backend.
#[instrument(skip_all, fields(%point_id))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(ctx): OptionalAuth,
    Path(point_id): Path<CollectionPointId>,
) -> Result<Json<ToggleResponse>, AppError> {
    let (mut set, _) = session_favorites(&state, &session, &ctx).await?;

    let controller = FavoritesController::new(state.gateway(), state.toggle_locks());
    let outcome = controller.toggle(&ctx, &mut set, point_id).await?;
    session_put(&session, session_keys::FAVORITES, &set).await?;

    Ok(Json(ToggleResponse {
        point_id,
        is_favorite: outcome.is_favorite(),
        favorites: set.len(),
    }))
}
