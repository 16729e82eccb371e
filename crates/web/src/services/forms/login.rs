//! Sign-in form.

use secrecy::SecretString;
use serde::Deserialize;

use clique_recicle_core::Email;

use super::{FormError, require};

#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    /// # Errors
    ///
    /// Blank fields or a malformed email.
    pub fn validate(&self) -> Result<(Email, SecretString), FormError> {
        require("email", &self.email)?;
        require("senha", &self.password)?;
        let email = Email::parse(&self.email)?;
        Ok((email, SecretString::from(self.password.clone())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_validate() {
        let form = LoginForm {
            email: " ana@exemplo.com ".to_string(),
            password: "segredo".to_string(),
        };
        let (email, password) = form.validate().unwrap();
        assert_eq!(email.as_str(), "ana@exemplo.com");
        assert_eq!(password.expose_secret(), "segredo");

        let blank = LoginForm {
            password: String::new(),
            ..form
        };
        assert_eq!(blank.validate().unwrap_err().message(), "Preencha o campo senha");
    }
}
