//! Dashboard form for creating and editing collection points.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use clique_recicle_core::{
    CollectionPoint, CollectionPointId, NewCollectionPoint, UserId, parse_materials,
};

use crate::gateway::{Gateway, GatewayError, PointFilter};
use crate::models::{CurrentUser, SessionContext};

use super::FormError;

pub const CREATED: &str = "Ponto de coleta cadastrado com sucesso!";
pub const CREATE_FAILED: &str = "Erro ao cadastrar ponto de coleta";
pub const UPDATED: &str = "Ponto de coleta atualizado com sucesso!";
pub const UPDATE_FAILED: &str = "Erro ao atualizar ponto de coleta";
pub const DELETED: &str = "Ponto de coleta excluído com sucesso!";
pub const DELETE_FAILED: &str = "Erro ao excluir ponto de coleta";

/// Collection point form fields. Materials are typed as comma-separated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionPointForm {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub materials: String,
    pub hours: String,
    pub phone: String,
}

impl CollectionPointForm {
    /// Prefill from an existing point for editing.
    #[must_use]
    pub fn from_point(point: &CollectionPoint) -> Self {
        Self {
            name: point.name.clone(),
            address: point.address.clone(),
            city: point.city.clone(),
            state: point.state.clone(),
            zip_code: point.zip_code.clone().unwrap_or_default(),
            materials: point.materials.join(", "),
            hours: point.hours.clone(),
            phone: point.phone.clone(),
        }
    }

    /// # Errors
    ///
    /// `FormError::Draft` for a blank required field or no materials.
    pub fn to_draft(&self, agent_id: UserId) -> Result<NewCollectionPoint, FormError> {
        NewCollectionPoint {
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: Some(self.zip_code.clone()),
            phone: self.phone.clone(),
            hours: self.hours.clone(),
            materials: parse_materials(&self.materials),
            agent_id,
        }
        .validated()
        .map_err(Into::into)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Create, edit and delete an agent's collection points.
pub struct PointEditor<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> PointEditor<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    /// The agent's own points, newest first.
    ///
    /// # Errors
    ///
    /// `AuthRequired`, `Forbidden` for non-agents, `RemoteRead`.
    pub async fn list_mine(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<CollectionPoint>, FormError> {
        let agent = require_agent(session)?;
        self.gateway
            .list_collection_points(PointFilter::by_agent(agent.id))
            .await
            .map_err(FormError::RemoteRead)
    }

    /// # Errors
    ///
    /// `AuthRequired`, `Forbidden` for non-agents, validation errors, and
    /// `RemoteWrite` if the insert failed.
    #[instrument(skip_all, fields(user_id = ?session.user().map(|u| u.id)))]
    pub async fn create(
        &self,
        session: &SessionContext,
        form: &CollectionPointForm,
    ) -> Result<CollectionPoint, FormError> {
        let agent = require_agent(session)?;
        let draft = form.to_draft(agent.id)?;
        let point = self
            .gateway
            .insert_collection_point(&agent.access_token, &draft)
            .await
            .map_err(|e| write_failed("insert", e))?;
        tracing::info!(point_id = %point.id, "Collection point created");
        Ok(point)
    }

    /// # Errors
    ///
    /// As [`PointEditor::create`], plus `NotFound` and `Forbidden` when the
    /// point does not exist or belongs to another agent.
    #[instrument(skip(self, session, form))]
    pub async fn update(
        &self,
        session: &SessionContext,
        id: CollectionPointId,
        form: &CollectionPointForm,
    ) -> Result<CollectionPoint, FormError> {
        let agent = require_agent(session)?;
        self.owned(agent, id).await?;
        let draft = form.to_draft(agent.id)?;
        let point = self
            .gateway
            .update_collection_point(&agent.access_token, id, &draft)
            .await
            .map_err(|e| write_failed("update", e))?;
        tracing::info!(point_id = %point.id, "Collection point updated");
        Ok(point)
    }

    /// # Errors
    ///
    /// `AuthRequired`, `Forbidden`, `NotFound`, `RemoteWrite`.
    #[instrument(skip(self, session))]
    pub async fn delete(
        &self,
        session: &SessionContext,
        id: CollectionPointId,
    ) -> Result<(), FormError> {
        let agent = require_agent(session)?;
        self.owned(agent, id).await?;
        self.gateway
            .delete_collection_point(&agent.access_token, id)
            .await
            .map_err(|e| write_failed("delete", e))?;
        tracing::info!(point_id = %id, "Collection point deleted");
        Ok(())
    }

    async fn owned(
        &self,
        agent: &CurrentUser,
        id: CollectionPointId,
    ) -> Result<CollectionPoint, FormError> {
        let point = self
            .gateway
            .get_collection_point(id)
            .await
            .map_err(|e| match e {
                GatewayError::NotFound(what) => FormError::NotFound(what),
                other => FormError::RemoteRead(other),
            })?;
        if !point.is_owned_by(agent.id) {
            tracing::warn!(point_id = %id, user_id = %agent.id, "Edit of another agent's point refused");
            return Err(FormError::Forbidden("alterar este ponto de coleta"));
        }
        Ok(point)
    }
}

fn require_agent(session: &SessionContext) -> Result<&CurrentUser, FormError> {
    let user = session.user().ok_or(FormError::AuthRequired)?;
    if !user.is_agent() {
        return Err(FormError::Forbidden("gerenciar pontos de coleta"));
    }
    Ok(user)
}

fn write_failed(op: &'static str, e: GatewayError) -> FormError {
    tracing::warn!(op, error = %e, "Collection point write failed");
    FormError::RemoteWrite(e)
}
