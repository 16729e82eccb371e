//! Form controllers.
//!
//! Each form is a plain struct of field values with setters for the parts
//! that have rules of their own (material checkboxes, photo slots). A
//! submission validates the fields and then makes exactly one create or
//! update call through the gateway. On failure the form value is left as it
//! was so the user can fix it and resubmit.

mod collection_point;
mod login;
mod onboarding;
mod registration;

pub use collection_point::{
    CREATED, CREATE_FAILED, CollectionPointForm, DELETED, DELETE_FAILED, PointEditor, UPDATED,
    UPDATE_FAILED,
};
pub use login::LoginForm;
pub use onboarding::{
    DEFAULT_END_HOUR, DEFAULT_START_HOUR, MAX_IMAGES, OnboardingController, OnboardingForm,
    OnboardingOutcome,
};
pub use registration::{MIN_PASSWORD_LENGTH, RegistrationForm};

use thiserror::Error;

use clique_recicle_core::{DraftError, EmailError};

use crate::gateway::GatewayError;

use super::uploads::UploadError;

/// Errors from form submission.
#[derive(Debug, Error)]
pub enum FormError {
    /// The action needs a signed-in user.
    #[error("sign-in required")]
    AuthRequired,

    /// Signed in, but not allowed to do this.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// A field value was rejected.
    #[error("invalid form: {0}")]
    Invalid(String),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("too many images (max {max})")]
    TooManyImages { max: usize },

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The record to edit does not exist or is not visible.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected the write.
    #[error("write failed: {0}")]
    RemoteWrite(#[source] GatewayError),

    /// A lookup needed before the write failed.
    #[error("read failed: {0}")]
    RemoteRead(#[source] GatewayError),
}

impl FormError {
    /// Message for the user, in the interface language.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AuthRequired => "Você precisa estar logado".to_string(),
            Self::Forbidden(what) => format!("Você não tem permissão para {what}"),
            Self::Invalid(message) => message.clone(),
            Self::Draft(DraftError::NoMaterials) => "Selecione pelo menos um material".to_string(),
            Self::Draft(DraftError::MissingField(field)) => {
                format!("Preencha o campo {}", field_label(field))
            }
            Self::Email(_) => "Email inválido".to_string(),
            Self::TooManyImages { max } => format!("Você pode adicionar no máximo {max} fotos"),
            Self::Upload(e) => format!("Não foi possível enviar a foto ({e})"),
            Self::NotFound(_) => "Ponto de coleta não encontrado".to_string(),
            Self::RemoteWrite(e) | Self::RemoteRead(e) => e.reason(),
        }
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "name" => "nome",
        "address" => "endereço",
        "city" => "cidade",
        "state" => "estado",
        "phone" => "telefone",
        "hours" => "horário",
        other => other,
    }
}

/// Reject blank required values.
fn require(label: &str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Invalid(format!("Preencha o campo {label}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_in_interface_language() {
        assert_eq!(FormError::AuthRequired.message(), "Você precisa estar logado");
        assert_eq!(
            FormError::Draft(DraftError::NoMaterials).message(),
            "Selecione pelo menos um material"
        );
        assert_eq!(
            FormError::Draft(DraftError::MissingField("city")).message(),
            "Preencha o campo cidade"
        );
        assert_eq!(
            FormError::TooManyImages { max: 4 }.message(),
            "Você pode adicionar no máximo 4 fotos"
        );
    }

    #[test]
    fn test_remote_write_surfaces_backend_reason() {
        let err = FormError::RemoteWrite(GatewayError::Unauthorized(
            "new row violates row-level security policy".to_string(),
        ));
        assert_eq!(err.message(), "new row violates row-level security policy");
    }
}
