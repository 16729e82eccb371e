//! Sign-up form.

use secrecy::SecretString;
use serde::Deserialize;

use clique_recicle_core::{Email, UserRole};

use crate::gateway::SignUp;

use super::{FormError, require};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form fields.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub user_type: UserRole,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("user_type", &self.user_type)
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    /// Validate the fields and build the provider request.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Invalid` for blank fields, a short password or a
    /// confirmation that does not match, and `FormError::Email` for an email
    /// that is not shaped like `local@domain`.
    pub fn validate(&self) -> Result<SignUp, FormError> {
        require("nome", &self.name)?;
        require("email", &self.email)?;
        require("CPF", &self.cpf)?;
        let email = Email::parse(&self.email)?;

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FormError::Invalid(format!(
                "A senha deve ter no mínimo {MIN_PASSWORD_LENGTH} caracteres"
            )));
        }
        if self.password != self.confirm_password {
            return Err(FormError::Invalid("As senhas não coincidem".to_string()));
        }

        Ok(SignUp {
            name: self.name.trim().to_owned(),
            email,
            cpf: self.cpf.trim().to_owned(),
            password: SecretString::from(self.password.clone()),
            role: self.user_type,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Ana Souza".to_string(),
            email: "Ana@Exemplo.com".to_string(),
            cpf: "123.456.789-00".to_string(),
            password: "segredo".to_string(),
            confirm_password: "segredo".to_string(),
            user_type: UserRole::Agent,
        }
    }

    #[test]
    fn test_valid_form_builds_sign_up() {
        let sign_up = form().validate().unwrap();
        assert_eq!(sign_up.email.as_str(), "ana@exemplo.com");
        assert_eq!(sign_up.role, UserRole::Agent);
        assert_eq!(sign_up.password(), "segredo");
    }

    #[test]
    fn test_short_password_rejected() {
        let form = RegistrationForm {
            password: "12345".to_string(),
            confirm_password: "12345".to_string(),
            ..form()
        };
        assert!(matches!(form.validate(), Err(FormError::Invalid(_))));
    }

    #[test]
    fn test_mismatched_confirmation_rejected() {
        let form = RegistrationForm {
            confirm_password: "outra-senha".to_string(),
            ..form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.message(), "As senhas não coincidem");
    }

    #[test]
    fn test_user_type_defaults_to_recycler() {
        let form: RegistrationForm = serde_json::from_str(
            r#"{"name":"Ana","email":"ana@exemplo.com","cpf":"1","password":"segredo","confirmPassword":"segredo"}"#,
        )
        .unwrap();
        assert_eq!(form.user_type, UserRole::Recycler);
        assert!(!format!("{form:?}").contains("segredo"));
    }
}
