//! Collection points and the drafts used to create or edit them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CollectionPointId, UserId};

/// Material options offered as checkboxes on the agent onboarding form.
pub const ONBOARDING_MATERIALS: [&str; 6] = [
    "Papel e Papelão",
    "Plástico",
    "Vidro",
    "Óleo Vegetal",
    "Eletrônicos",
    "Tecido",
];

/// Errors raised when a draft cannot become a collection point.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// A required text field is blank.
    #[error("required field is empty: {0}")]
    MissingField(&'static str),
    /// No accepted material was given.
    #[error("at least one material is required")]
    NoMaterials,
}

/// A physical location, owned by an agent, that accepts recyclable
/// materials during stated hours.
///
/// Mirrors a row of the `collection_points` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPoint {
    pub id: CollectionPointId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    pub phone: String,
    pub hours: String,
    /// Accepted material labels, in the order the agent entered them.
    pub materials: Vec<String>,
    pub agent_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl CollectionPoint {
    /// Whether `user` is the agent who owns this point.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.agent_id == user
    }
}

/// Field values for inserting or updating a collection point.
///
/// Serializes to the column set the backend expects, so the same value is
/// used as the body of both insert and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCollectionPoint {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: Option<String>,
    pub phone: String,
    pub hours: String,
    pub materials: Vec<String>,
    pub agent_id: UserId,
}

impl NewCollectionPoint {
    /// Trim every field, drop blank materials and blank zip codes, then
    /// check the draft is complete.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingField`] for the first blank required field
    /// and [`DraftError::NoMaterials`] when no material survives trimming.
    pub fn validated(self) -> Result<Self, DraftError> {
        let draft = Self {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self
                .zip_code
                .map(|zip| zip.trim().to_owned())
                .filter(|zip| !zip.is_empty()),
            phone: self.phone.trim().to_owned(),
            hours: self.hours.trim().to_owned(),
            materials: self
                .materials
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .map(str::to_owned)
                .collect(),
            agent_id: self.agent_id,
        };

        for (field, value) in [
            ("name", &draft.name),
            ("address", &draft.address),
            ("city", &draft.city),
            ("state", &draft.state),
            ("phone", &draft.phone),
            ("hours", &draft.hours),
        ] {
            if value.is_empty() {
                return Err(DraftError::MissingField(field));
            }
        }

        if draft.materials.is_empty() {
            return Err(DraftError::NoMaterials);
        }

        Ok(draft)
    }

    /// Prefill a draft from an existing point (used by the edit form).
    #[must_use]
    pub fn from_point(point: &CollectionPoint) -> Self {
        Self {
            name: point.name.clone(),
            address: point.address.clone(),
            city: point.city.clone(),
            state: point.state.clone(),
            zip_code: point.zip_code.clone(),
            phone: point.phone.clone(),
            hours: point.hours.clone(),
            materials: point.materials.clone(),
            agent_id: point.agent_id,
        }
    }
}

/// Split the comma-separated materials field of the dashboard form.
///
/// Entries are trimmed, blanks are dropped and order is kept.
///
/// ```
/// use clique_recicle_core::parse_materials;
///
/// assert_eq!(parse_materials("Papel, Plástico,, Vidro "), ["Papel", "Plástico", "Vidro"]);
/// ```
#[must_use]
pub fn parse_materials(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .collect()
}
