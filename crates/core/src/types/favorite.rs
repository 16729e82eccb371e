//! Favorites: a user's bookmark on a collection point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::collection_point::CollectionPoint;
use super::id::{CollectionPointId, FavoriteId, UserId};

/// A row of the `favorites` table, optionally joined with its point.
///
/// The backend returns the joined record under `collection_points` when the
/// listing embeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub collection_point_id: CollectionPointId,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "collection_points")]
    pub collection_point: Option<CollectionPoint>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_join() {
        let json = serde_json::json!({
            "id": "a3f1c2d4-0000-4000-8000-000000000001",
            "user_id": "a3f1c2d4-0000-4000-8000-000000000002",
            "collection_point_id": "a3f1c2d4-0000-4000-8000-000000000003",
            "created_at": "2025-03-01T12:00:00Z"
        });
        let favorite: Favorite = serde_json::from_value(json).unwrap();
        assert!(favorite.collection_point.is_none());
    }

    #[test]
    fn test_deserialize_null_join() {
        let json = serde_json::json!({
            "id": "a3f1c2d4-0000-4000-8000-000000000001",
            "user_id": "a3f1c2d4-0000-4000-8000-000000000002",
            "collection_point_id": "a3f1c2d4-0000-4000-8000-000000000003",
            "created_at": "2025-03-01T12:00:00Z",
            "collection_points": null
        });
        let favorite: Favorite = serde_json::from_value(json).unwrap();
        assert!(favorite.collection_point.is_none());
    }
}
