//! Agent onboarding handlers.

use axum::{Json, extract::State, http::StatusCode};
use clique_recicle_core::ONBOARDING_MATERIALS;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::SessionContext;
use crate::services::forms::{
    CREATE_FAILED, MAX_IMAGES, OnboardingController, OnboardingForm, OnboardingOutcome,
};
use crate::services::uploads::{ImageFile, MAX_IMAGE_BYTES};
use crate::state::AppState;

/// Largest accepted `POST /agent-onboarding` body: every photo slot filled
/// at the size limit, base64 encoded, plus room for the form fields.
pub const BODY_LIMIT: usize = MAX_IMAGES * MAX_IMAGE_BYTES.div_ceil(3) * 4 + 64 * 1024;

/// Empty form plus the options the front end renders.
#[derive(Debug, Serialize)]
pub struct OnboardingPage {
    pub form: OnboardingForm,
    pub materials: &'static [&'static str],
    pub max_images: usize,
}

/// A photo as sent by the front end.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    /// Base64 file contents.
    pub data: String,
}

/// Body of `POST /agent-onboarding`.
#[derive(Debug, Deserialize)]
pub struct OnboardingPayload {
    #[serde(flatten)]
    pub form: OnboardingForm,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
}

/// `GET /agent-onboarding`
pub async fn form() -> Json<OnboardingPage> {
    Json(OnboardingPage {
        form: OnboardingForm::default(),
        materials: &ONBOARDING_MATERIALS,
        max_images: MAX_IMAGES,
    })
}

/// `POST /agent-onboarding`
///
/// Responds 201 with the created point. Signed out, responds 401 before the
/// photos are looked at.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<OnboardingPayload>,
) -> Result<(StatusCode, Json<OnboardingOutcome>), AppError> {
    let ctx = SessionContext::signed_in(user);
    let OnboardingPayload { mut form, images } = payload;

    let files = images
        .into_iter()
        .map(|image| ImageFile::from_base64(image.file_name, image.content_type, &image.data))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::from_form(e.into(), CREATE_FAILED))?;
    form.attach_images(files)
        .map_err(|e| AppError::from_form(e, CREATE_FAILED))?;

    let outcome = OnboardingController::new(state.gateway(), state.uploader())
        .submit(&ctx, &form)
        .await
        .map_err(|e| AppError::from_form(e, CREATE_FAILED))?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
