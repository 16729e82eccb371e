//! Agent onboarding: the first collection point of a new agent.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use clique_recicle_core::{
    CollectionPoint, DraftError, NewCollectionPoint, ONBOARDING_MATERIALS, UserId,
};

use crate::gateway::Gateway;
use crate::models::SessionContext;
use crate::services::uploads::{ImageFile, ImageUploader};

use super::FormError;

pub const MAX_IMAGES: usize = 4;
pub const DEFAULT_START_HOUR: &str = "06:00";
pub const DEFAULT_END_HOUR: &str = "18:00";

/// Onboarding form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnboardingForm {
    pub name: String,
    pub cep: String,
    pub state: String,
    pub city: String,
    pub bairro: String,
    pub rua: String,
    /// Checked materials, in the order they were checked.
    pub materials: Vec<String>,
    pub start_hour: String,
    pub end_hour: String,
    pub whatsapp: String,
    /// Contact email; shown to the agent but not stored with the point.
    pub email: String,
    pub phone: String,
    #[serde(skip)]
    images: Vec<ImageFile>,
}

impl Default for OnboardingForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            cep: String::new(),
            state: String::new(),
            city: String::new(),
            bairro: String::new(),
            rua: String::new(),
            materials: Vec::new(),
            start_hour: DEFAULT_START_HOUR.to_string(),
            end_hour: DEFAULT_END_HOUR.to_string(),
            whatsapp: String::new(),
            email: String::new(),
            phone: String::new(),
            images: Vec::new(),
        }
    }
}

impl OnboardingForm {
    /// Check or uncheck one of the fixed material options.
    ///
    /// Returns whether the material is checked afterwards.
    ///
    /// # Errors
    ///
    /// `FormError::Invalid` for a label outside [`ONBOARDING_MATERIALS`].
    pub fn toggle_material(&mut self, material: &str) -> Result<bool, FormError> {
        if !ONBOARDING_MATERIALS.contains(&material) {
            return Err(unknown_material(material));
        }
        if let Some(pos) = self.materials.iter().position(|m| m == material) {
            self.materials.remove(pos);
            Ok(false)
        } else {
            self.materials.push(material.to_owned());
            Ok(true)
        }
    }

    /// Attach photos as one batch.
    ///
    /// # Errors
    ///
    /// `FormError::TooManyImages` if the batch would take the form past
    /// [`MAX_IMAGES`]; nothing is attached in that case.
    pub fn attach_images(
        &mut self,
        files: impl IntoIterator<Item = ImageFile>,
    ) -> Result<(), FormError> {
        let files: Vec<ImageFile> = files.into_iter().collect();
        if self.images.len() + files.len() > MAX_IMAGES {
            return Err(FormError::TooManyImages { max: MAX_IMAGES });
        }
        self.images.extend(files);
        Ok(())
    }

    /// Drop the photo in slot `index`, if there is one.
    pub fn remove_image(&mut self, index: usize) -> Option<ImageFile> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    #[must_use]
    pub fn images(&self) -> &[ImageFile] {
        &self.images
    }

    /// Back to an empty form with default hours.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `"{rua}, {bairro}"`, leaving out whichever part is blank.
    #[must_use]
    pub fn address(&self) -> String {
        [self.rua.trim(), self.bairro.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"{start} - {end}"`.
    #[must_use]
    pub fn hours(&self) -> String {
        format!("{} - {}", self.start_hour.trim(), self.end_hour.trim())
    }

    /// The phone number, falling back to the WhatsApp number.
    #[must_use]
    pub fn contact_phone(&self) -> &str {
        if self.phone.trim().is_empty() {
            &self.whatsapp
        } else {
            &self.phone
        }
    }

    /// Build the validated draft for `agent_id`.
    ///
    /// # Errors
    ///
    /// `NoMaterials` when nothing is checked, `Invalid` for an unknown
    /// material, `MissingField` for the first blank required field.
    pub fn to_draft(&self, agent_id: UserId) -> Result<NewCollectionPoint, FormError> {
        if self.materials.is_empty() {
            return Err(DraftError::NoMaterials.into());
        }
        if let Some(unknown) = self
            .materials
            .iter()
            .find(|m| !ONBOARDING_MATERIALS.contains(&m.as_str()))
        {
            return Err(unknown_material(unknown));
        }
        if self.start_hour.trim().is_empty() || self.end_hour.trim().is_empty() {
            return Err(DraftError::MissingField("hours").into());
        }

        let draft = NewCollectionPoint {
            name: self.name.clone(),
            address: self.address(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: Some(self.cep.clone()),
            phone: self.contact_phone().to_owned(),
            hours: self.hours(),
            materials: self.materials.clone(),
            agent_id,
        };
        draft.validated().map_err(Into::into)
    }
}

fn unknown_material(material: &str) -> FormError {
    FormError::Invalid(format!("Material desconhecido: {material}"))
}

/// Result of a successful onboarding.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingOutcome {
    pub point: CollectionPoint,
    /// Where each attached photo ended up.
    pub image_urls: Vec<String>,
    pub message: &'static str,
    /// Where the front end goes next.
    pub redirect_to: &'static str,
}

/// Submits the onboarding form.
pub struct OnboardingController<'a> {
    gateway: &'a dyn Gateway,
    uploader: &'a dyn ImageUploader,
}

impl<'a> OnboardingController<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn Gateway, uploader: &'a dyn ImageUploader) -> Self {
        Self { gateway, uploader }
    }

    /// Create the agent's collection point from the form.
    ///
    /// Photos are uploaded before the insert; the insert is the only write.
    ///
    /// # Errors
    ///
    /// `AuthRequired` when signed out, validation errors from
    /// [`OnboardingForm::to_draft`], `Upload` if a photo was refused, and
    /// `RemoteWrite` if the backend rejected the insert.
    #[instrument(skip_all, fields(user_id = ?session.user().map(|u| u.id)))]
    pub async fn submit(
        &self,
        session: &SessionContext,
        form: &OnboardingForm,
    ) -> Result<OnboardingOutcome, FormError> {
        let user = session.user().ok_or(FormError::AuthRequired)?;
        let draft = form.to_draft(user.id)?;

        let mut image_urls = Vec::with_capacity(form.images.len());
        for image in &form.images {
            image_urls.push(self.uploader.upload_image(image).await?);
        }

        let point = self
            .gateway
            .insert_collection_point(&user.access_token, &draft)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Onboarding insert failed");
                FormError::RemoteWrite(e)
            })?;

        tracing::info!(point_id = %point.id, images = image_urls.len(), "Agent onboarded");
        Ok(OnboardingOutcome {
            point,
            image_urls,
            message: super::CREATED,
            redirect_to: "/",
        })
    }
}
