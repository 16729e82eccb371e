//! Collection point search and pagination.
//!
//! Filtering and paging happen locally over the list the gateway returned:
//!
//! - a point matches when its name, address or city contains the query, or
//!   when any of its materials does (case-insensitive substring match)
//! - an empty query matches everything, keeping the original order
//! - pages are 1-indexed slices of a fixed size over the filtered list
//!
//! Changing the query does not move the stored page. Every read of the
//! current page clamps it to `[1, total_pages]` instead, so narrowing a
//! search while on page 3 shows the last page that still exists.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use clique_recicle_core::CollectionPoint;

use crate::gateway::GatewayResult;
use crate::models::Notice;

use super::fetch::{FetchOutcome, FetchSequence, FetchTicket};

/// Notice shown when the list could not be loaded.
pub const LOAD_FAILED: &str = "Erro ao carregar pontos de coleta";

/// Whether `point` matches `query` (case-insensitive substring).
#[must_use]
pub fn matches(point: &CollectionPoint, query: &str) -> bool {
    matches_lowercase(point, &query.to_lowercase())
}

fn matches_lowercase(point: &CollectionPoint, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |field: &str| field.to_lowercase().contains(needle);
    contains(&point.name)
        || contains(&point.address)
        || contains(&point.city)
        || point.materials.iter().any(|m| contains(m))
}

/// Points matching `query`, in their original order.
#[must_use]
pub fn filter<'a>(points: &'a [CollectionPoint], query: &str) -> Vec<&'a CollectionPoint> {
    let needle = query.to_lowercase();
    points
        .iter()
        .filter(|p| matches_lowercase(p, &needle))
        .collect()
}

/// Search text and requested page, kept in the session between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogState {
    pub query: String,
    pub page: usize,
    #[serde(default)]
    pub fetches: FetchSequence,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: 1,
            fetches: FetchSequence::default(),
        }
    }
}

/// List, search and paginate controller.
#[derive(Debug)]
pub struct ListController {
    points: Vec<CollectionPoint>,
    state: CatalogState,
    page_size: usize,
    notice: Option<Notice>,
}

impl ListController {
    /// Empty controller on page 1 with no query.
    ///
    /// A `page_size` of zero is treated as one.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self::with_state(CatalogState::default(), page_size)
    }

    /// Resume from state saved in the session.
    #[must_use]
    pub fn with_state(state: CatalogState, page_size: usize) -> Self {
        Self {
            points: Vec::new(),
            state,
            page_size: page_size.max(1),
            notice: None,
        }
    }

    /// State to save back into the session.
    #[must_use]
    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    /// Replace the search text. The stored page is left alone.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.state.query = text.into();
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.state.query
    }

    /// Every loaded point, unfiltered.
    #[must_use]
    pub fn points(&self) -> &[CollectionPoint] {
        &self.points
    }

    #[must_use]
    pub fn filtered(&self) -> Vec<&CollectionPoint> {
        filter(&self.points, &self.state.query)
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(filtered / page_size)`; zero when nothing matches.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// The pager is only shown when there is more than one page.
    #[must_use]
    pub fn show_pager(&self) -> bool {
        self.total_pages() > 1
    }

    /// Items on page `n` (1-indexed); empty outside `[1, total_pages]`.
    #[must_use]
    pub fn page(&self, n: usize) -> Vec<&CollectionPoint> {
        let Some(start) = n.checked_sub(1).map(|i| i * self.page_size) else {
            return Vec::new();
        };
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    /// The stored page clamped to the pages that exist.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.clamp(self.state.page)
    }

    /// Items on the current page.
    #[must_use]
    pub fn current_items(&self) -> Vec<&CollectionPoint> {
        self.page(self.current_page())
    }

    /// Jump to page `n`, bounded to `[1, total_pages]`.
    pub fn go_to(&mut self, n: usize) {
        self.state.page = self.clamp(n);
    }

    pub fn next(&mut self) {
        self.go_to(self.current_page().saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.go_to(self.current_page().saturating_sub(1));
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    fn clamp(&self, n: usize) -> usize {
        n.clamp(1, self.total_pages().max(1))
    }

    /// Start loading the list; the returned ticket must be handed back.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.state.fetches.issue()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.fetches.is_loading()
    }

    /// Apply a fetch result unless a newer fetch has started since.
    ///
    /// A failed fetch leaves an empty list and an error notice.
    #[instrument(skip(self, result), fields(ok = result.is_ok()))]
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: GatewayResult<Vec<CollectionPoint>>,
    ) -> FetchOutcome {
        if !self.state.fetches.settle(ticket) {
            tracing::debug!(?ticket, "Discarding stale collection point fetch");
            return FetchOutcome::Stale;
        }

        match result {
            Ok(points) => {
                self.points = points;
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load collection points");
                self.points.clear();
                self.notice = Some(Notice::error(LOAD_FAILED));
            }
        }
        FetchOutcome::Applied
    }

    /// Notice left by the last applied fetch.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}
