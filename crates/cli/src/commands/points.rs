//! Inspect collection points the way the site lists them.
//!
//! # Usage
//!
//! ```bash
//! cr-cli points list --query verde --page 2
//! cr-cli points list --agent <uuid>
//! ```

use clique_recicle_core::{CollectionPoint, UserId};
use clique_recicle_web::config::CatalogConfig;
use clique_recicle_web::gateway::{Gateway, PointFilter};
use clique_recicle_web::services::catalog::ListController;

use super::{CommandError, connect};

/// One line per point.
fn summary(point: &CollectionPoint) -> String {
    format!(
        "{}  {} - {}, {}/{} [{}]",
        point.id,
        point.name,
        point.address,
        point.city,
        point.state,
        point.materials.join(", ")
    )
}

/// Page through `points` with the site's page size.
fn paginate(
    catalog: CatalogConfig,
    points: Vec<CollectionPoint>,
    query: Option<String>,
    page: usize,
) -> ListController {
    let mut list = ListController::new(catalog.page_size);
    if let Some(query) = query {
        list.set_query(query);
    }
    let ticket = list.begin_fetch();
    list.complete_fetch(ticket, Ok(points));
    list.go_to(page);
    list
}

/// List one page of points, optionally owned by `agent` and matching `query`.
///
/// # Errors
///
/// Returns an error if configuration is missing or the listing fails.
#[allow(clippy::print_stdout)]
pub async fn list(
    agent: Option<UserId>,
    query: Option<String>,
    page: usize,
) -> Result<(), CommandError> {
    let (client, _) = connect()?;
    let catalog = CatalogConfig::from_env()?;
    let filter = agent.map_or_else(PointFilter::all, PointFilter::by_agent);

    let points = client.list_collection_points(filter).await?;
    let list = paginate(catalog, points, query, page);

    for point in list.current_items() {
        println!("{}", summary(point));
    }
    println!(
        "page {}/{} ({} matching)",
        list.current_page(),
        list.total_pages().max(1),
        list.filtered().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use clique_recicle_core::CollectionPointId;

    use super::*;

    fn points(n: usize) -> Vec<CollectionPoint> {
        (0..n)
            .map(|i| CollectionPoint {
                id: CollectionPointId::generate(),
                name: format!("Ponto {i}"),
                address: "Rua A, 1".to_string(),
                city: "Campinas".to_string(),
                state: "SP".to_string(),
                zip_code: None,
                phone: "(19) 3333-0000".to_string(),
                hours: "06:00 - 18:00".to_string(),
                materials: vec!["Vidro".to_string()],
                agent_id: UserId::generate(),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_paginate_uses_configured_page_size() {
        let list = paginate(CatalogConfig { page_size: 5 }, points(12), None, 3);
        assert_eq!(list.total_pages(), 3);
        assert_eq!(list.current_page(), 3);
        assert_eq!(list.current_items().len(), 2);
    }

    #[test]
    fn test_paginate_filters_before_paging() {
        let list = paginate(
            CatalogConfig::default(),
            points(12),
            Some("ponto 1".to_string()),
            1,
        );
        // "Ponto 1", "Ponto 10" and "Ponto 11".
        assert_eq!(list.filtered().len(), 3);
    }
}
