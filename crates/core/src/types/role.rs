//! User roles.

use serde::{Deserialize, Serialize};

/// Role of a signed-in user.
///
/// Stored by the auth provider in the user's metadata (`user_type`) and in
/// the `user_roles` table. Only agents may register and manage collection
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular user who looks for collection points.
    #[default]
    Recycler,
    /// Recycling agent who owns collection points.
    Agent,
}

impl UserRole {
    /// Whether this role may create and manage collection points.
    #[must_use]
    pub const fn is_agent(self) -> bool {
        matches!(self, Self::Agent)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recycler => write!(f, "recycler"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recycler" | "user" => Ok(Self::Recycler),
            "agent" => Ok(Self::Agent),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_text() {
        for role in [UserRole::Recycler, UserRole::Agent] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_legacy_user_alias() {
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::Recycler);
    }

    #[test]
    fn test_default_is_recycler() {
        assert_eq!(UserRole::default(), UserRole::Recycler);
        assert!(!UserRole::default().is_agent());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&UserRole::Agent).unwrap(), "\"agent\"");
    }
}
