//! Favorites of the signed-in user.
//!
//! Local state only changes after the remote write has succeeded. Toggles on
//! the same (user, point) pair are serialized by [`ToggleLocks`], and each
//! one decides its direction from the backend while holding the lock, so
//! two overlapping toggles add then remove instead of adding twice. The
//! remote insert is idempotent as well.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::instrument;

use clique_recicle_core::{CollectionPointId, Favorite, FavoriteId, UserId};

use crate::gateway::{Gateway, GatewayError};
use crate::models::{CurrentUser, SessionContext};

use super::fetch::{FetchOutcome, FetchSequence, FetchTicket};

pub const LOAD_FAILED: &str = "Erro ao carregar favoritos";
pub const REMOVED: &str = "Favorito removido!";
pub const REMOVE_FAILED: &str = "Erro ao remover favorito";
pub const TOGGLE_FAILED: &str = "Erro ao atualizar favorito";

/// Errors from favorite operations.
#[derive(Debug, Error)]
pub enum FavoritesError {
    /// Nobody is signed in.
    #[error("sign-in required")]
    AuthRequired,

    /// The remote write failed; local state was not touched.
    #[error("favorite write failed: {0}")]
    RemoteWrite(#[source] GatewayError),

    /// The remote read failed; local state was not touched.
    #[error("favorite read failed: {0}")]
    RemoteRead(#[source] GatewayError),
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    #[must_use]
    pub const fn is_favorite(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Changes accepted by [`FavoriteSet`]; all go through one update path.
enum Change {
    Replace(Vec<Favorite>),
    Insert(Favorite),
    Remove(CollectionPointId),
    Clear,
}

/// Favorited point ids plus the hydrated favorite rows, kept in lockstep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredFavorites", into = "StoredFavorites")]
pub struct FavoriteSet {
    ids: HashSet<CollectionPointId>,
    entries: Vec<Favorite>,
    fetches: FetchSequence,
}

#[derive(Serialize, Deserialize)]
struct StoredFavorites {
    entries: Vec<Favorite>,
    #[serde(default)]
    fetches: FetchSequence,
}

impl From<StoredFavorites> for FavoriteSet {
    fn from(stored: StoredFavorites) -> Self {
        let mut set = Self {
            fetches: stored.fetches,
            ..Self::default()
        };
        set.apply(Change::Replace(stored.entries));
        set
    }
}

impl From<FavoriteSet> for StoredFavorites {
    fn from(set: FavoriteSet) -> Self {
        Self {
            entries: set.entries,
            fetches: set.fetches,
        }
    }
}

impl FavoriteSet {
    #[must_use]
    pub fn from_favorites(favorites: Vec<Favorite>) -> Self {
        let mut set = Self::default();
        set.apply(Change::Replace(favorites));
        set
    }

    #[must_use]
    pub fn contains(&self, point_id: CollectionPointId) -> bool {
        self.ids.contains(&point_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Favorite rows, newest first as the backend returned them.
    #[must_use]
    pub fn entries(&self) -> &[Favorite] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = CollectionPointId> + '_ {
        self.ids.iter().copied()
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::Replace(favorites) => {
                self.entries.clear();
                self.ids.clear();
                for favorite in favorites {
                    if self.ids.insert(favorite.collection_point_id) {
                        self.entries.push(favorite);
                    }
                }
            }
            Change::Insert(favorite) => {
                if self.ids.insert(favorite.collection_point_id) {
                    self.entries.insert(0, favorite);
                }
            }
            Change::Remove(point_id) => {
                if self.ids.remove(&point_id) {
                    self.entries.retain(|f| f.collection_point_id != point_id);
                }
            }
            Change::Clear => {
                self.ids.clear();
                self.entries.clear();
            }
        }
    }

    /// Start loading; see [`FavoritesController::load`].
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetches.issue()
    }

    /// Replace everything with a fetch result unless a newer fetch started.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, favorites: Vec<Favorite>) -> FetchOutcome {
        if !self.fetches.settle(ticket) {
            return FetchOutcome::Stale;
        }
        self.apply(Change::Replace(favorites));
        FetchOutcome::Applied
    }

    /// Forget everything (sign-out).
    pub fn clear(&mut self) {
        self.apply(Change::Clear);
        self.fetches = FetchSequence::default();
    }
}

type ToggleKey = (UserId, CollectionPointId);

/// Per (user, point) locks held across a toggle's remote write.
#[derive(Debug, Default)]
pub struct ToggleLocks {
    locks: Mutex<HashMap<ToggleKey, Arc<AsyncMutex<()>>>>,
}

impl ToggleLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the pair.
    pub async fn acquire(&self, user_id: UserId, point_id: CollectionPointId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on only reference themselves.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry((user_id, point_id)).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of pairs currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Favorites toggle controller.
pub struct FavoritesController<'a> {
    gateway: &'a dyn Gateway,
    locks: &'a ToggleLocks,
}

impl<'a> FavoritesController<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn Gateway, locks: &'a ToggleLocks) -> Self {
        Self { gateway, locks }
    }

    /// Reload the user's favorites, replacing `set` wholesale.
    ///
    /// Signed out, the set is cleared without a gateway call.
    ///
    /// # Errors
    ///
    /// `RemoteRead` if the fetch failed; `set` keeps its previous contents.
    #[instrument(skip_all, fields(user_id = ?session.user().map(|u| u.id)))]
    pub async fn load(
        &self,
        session: &SessionContext,
        set: &mut FavoriteSet,
    ) -> Result<FetchOutcome, FavoritesError> {
        let Some(user) = session.user() else {
            set.clear();
            return Ok(FetchOutcome::Applied);
        };

        let ticket = set.begin_fetch();
        match self.gateway.list_favorites(&user.access_token, user.id).await {
            Ok(favorites) => Ok(set.complete_fetch(ticket, favorites)),
            Err(e) => {
                set.fetches.settle(ticket);
                tracing::warn!(error = %e, "Failed to load favorites");
                Err(FavoritesError::RemoteRead(e))
            }
        }
    }

    /// Flip whether `point_id` is a favorite.
    ///
    /// Membership is read from the backend while the pair's lock is held, so
    /// a `set` cached by another tab or request cannot make two toggles take
    /// the same direction.
    ///
    /// # Errors
    ///
    /// `AuthRequired` when signed out (no gateway call is made);
    /// `RemoteWrite` when the backend could not be read or rejected the
    /// change. `set` is only modified on success.
    #[instrument(skip(self, session, set), fields(user_id = ?session.user().map(|u| u.id)))]
    pub async fn toggle(
        &self,
        session: &SessionContext,
        set: &mut FavoriteSet,
        point_id: CollectionPointId,
    ) -> Result<ToggleOutcome, FavoritesError> {
        let user = session.user().ok_or(FavoritesError::AuthRequired)?;
        let _guard = self.locks.acquire(user.id, point_id).await;

        let is_favorite = self
            .gateway
            .list_favorites(&user.access_token, user.id)
            .await
            .map_err(|e| write_failed(user, e))?
            .iter()
            .any(|f| f.collection_point_id == point_id);
        if is_favorite != set.contains(point_id) {
            tracing::debug!(%point_id, is_favorite, "Cached favorites were out of date");
        }

        if is_favorite {
            self.gateway
                .delete_favorite(&user.access_token, user.id, point_id)
                .await
                .map_err(|e| write_failed(user, e))?;
            set.apply(Change::Remove(point_id));
            tracing::info!(%point_id, "Favorite removed");
            Ok(ToggleOutcome::Removed)
        } else {
            let favorite = self
                .gateway
                .insert_favorite(&user.access_token, user.id, point_id)
                .await
                .map_err(|e| write_failed(user, e))?;
            set.apply(Change::Insert(favorite));
            tracing::info!(%point_id, "Favorite added");
            Ok(ToggleOutcome::Added)
        }
    }

    /// Delete a favorite by its own id, then reload the set.
    ///
    /// # Errors
    ///
    /// `AuthRequired` when signed out; `RemoteWrite` if the delete failed;
    /// `RemoteRead` if the reload after a successful delete failed.
    #[instrument(skip(self, session, set))]
    pub async fn remove(
        &self,
        session: &SessionContext,
        set: &mut FavoriteSet,
        favorite_id: FavoriteId,
    ) -> Result<(), FavoritesError> {
        let user = session.user().ok_or(FavoritesError::AuthRequired)?;
        self.gateway
            .delete_favorite_by_id(&user.access_token, favorite_id)
            .await
            .map_err(|e| write_failed(user, e))?;
        self.load(session, set).await?;
        Ok(())
    }
}

fn write_failed(user: &CurrentUser, e: GatewayError) -> FavoritesError {
    tracing::warn!(user_id = %user.id, error = %e, "Favorite write failed");
    FavoritesError::RemoteWrite(e)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn favorite(point_id: CollectionPointId) -> Favorite {
        Favorite {
            id: FavoriteId::generate(),
            user_id: UserId::generate(),
            collection_point_id: point_id,
            created_at: Utc::now(),
            collection_point: None,
        }
    }

    #[test]
    fn test_set_ids_follow_entries() {
        let a = CollectionPointId::generate();
        let b = CollectionPointId::generate();
        let mut set = FavoriteSet::from_favorites(vec![favorite(a), favorite(a), favorite(b)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.entries().len(), 2);

        set.apply(Change::Remove(a));
        assert!(!set.contains(a));
        assert_eq!(set.entries().len(), 1);

        set.apply(Change::Insert(favorite(b)));
        assert_eq!(set.entries().len(), 1);
    }

    #[test]
    fn test_set_session_roundtrip_rebuilds_ids() {
        let a = CollectionPointId::generate();
        let set = FavoriteSet::from_favorites(vec![favorite(a)]);
        let json = serde_json::to_value(&set).unwrap();
        let back: FavoriteSet = serde_json::from_value(json).unwrap();
        assert!(back.contains(a));
        assert_eq!(back, set);
    }

    #[test]
    fn test_stale_favorites_fetch_discarded() {
        let a = CollectionPointId::generate();
        let mut set = FavoriteSet::default();
        let old = set.begin_fetch();
        let new = set.begin_fetch();
        assert_eq!(set.complete_fetch(new, vec![]), FetchOutcome::Applied);
        assert_eq!(set.complete_fetch(old, vec![favorite(a)]), FetchOutcome::Stale);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_locks_prune_idle_pairs() {
        let locks = ToggleLocks::new();
        let user = UserId::generate();
        {
            let _held = locks.acquire(user, CollectionPointId::generate()).await;
            assert_eq!(locks.tracked(), 1);
        }
        let _other = locks.acquire(user, CollectionPointId::generate()).await;
        assert_eq!(locks.tracked(), 1);
    }
}
