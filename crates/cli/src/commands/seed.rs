//! Seed collection points from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! cr-cli seed points crates/cli/seed/collection_points.yaml --agent <uuid>
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - project and public key
//! - `SUPABASE_SERVICE_ROLE_KEY` - required; inserts bypass row-level security

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use clique_recicle_core::{NewCollectionPoint, UserId};
use clique_recicle_web::gateway::Gateway;

use super::{CommandError, connect, service_token};

/// One point in the seed file. The owning agent comes from the command line.
#[derive(Debug, Deserialize)]
pub struct SeedPoint {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    pub phone: String,
    pub hours: String,
    pub materials: Vec<String>,
}

impl SeedPoint {
    fn into_draft(self, agent_id: UserId) -> NewCollectionPoint {
        NewCollectionPoint {
            name: self.name,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            phone: self.phone,
            hours: self.hours,
            materials: self.materials,
            agent_id,
        }
    }
}

/// Parse and validate every entry before anything is written.
///
/// # Errors
///
/// Returns the YAML error, or the first entry that fails validation.
pub fn parse_seed(content: &str, agent_id: UserId) -> Result<Vec<NewCollectionPoint>, CommandError> {
    let entries: Vec<SeedPoint> = serde_yaml::from_str(content)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = entry.name.clone();
            entry
                .into_draft(agent_id)
                .validated()
                .map_err(|source| CommandError::InvalidEntry {
                    index,
                    name,
                    source,
                })
        })
        .collect()
}

/// Insert the points in `file_path`, owned by `agent_id`.
///
/// # Errors
///
/// Returns an error if configuration is missing, the file is unreadable or
/// invalid. Individual insert failures are logged and counted.
pub async fn points(file_path: &str, agent_id: UserId) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(CommandError::FileNotFound(file_path.to_string()));
    }

    info!(path = %file_path, "Loading collection points from file");
    let content = tokio::fs::read_to_string(path).await?;
    let drafts = parse_seed(&content, agent_id)?;
    info!(points = drafts.len(), "Seed file validated");

    let (client, config) = connect()?;
    let token = service_token(&config)?;

    let mut inserted = 0usize;
    let mut failed = 0usize;
    for draft in &drafts {
        match client.insert_collection_point(&token, draft).await {
            Ok(point) => {
                inserted += 1;
                info!(point_id = %point.id, name = %point.name, "Inserted");
            }
            Err(e) => {
                failed += 1;
                error!(name = %draft.name, error = %e, "Insert failed");
            }
        }
    }

    info!("Seeding complete!");
    info!("  Points inserted: {inserted}");
    if failed > 0 {
        error!("  Failures: {failed}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_file_parses() {
        let content = include_str!("../../seed/collection_points.yaml");
        let agent = UserId::generate();
        let drafts = parse_seed(content, agent).unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[1].name, "Recicladora Verde");
        assert_eq!(drafts[1].materials, ["Plástico", "Metal", "Eletrônicos"]);
        assert!(drafts.iter().all(|d| d.agent_id == agent));
    }

    #[test]
    fn test_entry_without_materials_names_the_entry() {
        let content = "\
- name: Vazio
  address: Rua A, 1
  city: Recife
  state: PE
  phone: '81 0000-0000'
  hours: 8h-12h
  materials: []
";
        let err = parse_seed(content, UserId::generate()).unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidEntry { index: 0, ref name, source: clique_recicle_core::DraftError::NoMaterials }
                if name == "Vazio"
        ));
    }
}
