//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use clique_recicle_core::{Email, UserId, UserRole};

use crate::gateway::{AccessToken, AuthSession};

/// Session-stored user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth provider's user id.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Resolved role.
    pub role: UserRole,
    /// Token used for writes made on the user's behalf.
    pub access_token: AccessToken,
}

impl CurrentUser {
    /// Build the session identity from a provider session and a resolved role.
    #[must_use]
    pub fn from_auth(session: AuthSession, role: UserRole) -> Self {
        Self {
            id: session.user.id,
            email: session.user.email,
            role,
            access_token: session.access_token,
        }
    }

    #[must_use]
    pub const fn is_agent(&self) -> bool {
        self.role.is_agent()
    }
}

/// Who is making the current request.
///
/// Handed to every controller; created at sign-in, emptied at sign-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    user: Option<CurrentUser>,
}

impl SessionContext {
    /// A context with nobody signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    #[must_use]
    pub const fn signed_in(user: CurrentUser) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Forget the signed-in user.
    pub fn clear(&mut self) {
        self.user = None;
    }
}

impl From<Option<CurrentUser>> for SessionContext {
    fn from(user: Option<CurrentUser>) -> Self {
        Self { user }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the signed-in user's favorites.
    pub const FAVORITES: &str = "favorites";

    /// Key for the collection point list's search and page.
    pub const CATALOG: &str = "catalog";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::AuthUser;

    #[test]
    fn test_current_user_from_auth() {
        let session = AuthSession {
            user: AuthUser {
                id: UserId::generate(),
                email: Email::parse("agente@exemplo.com").unwrap(),
                role_hint: None,
            },
            access_token: AccessToken::new("tok"),
        };
        let user = CurrentUser::from_auth(session.clone(), UserRole::Agent);
        assert_eq!(user.id, session.user.id);
        assert!(user.is_agent());
    }

    #[test]
    fn test_current_user_session_roundtrip_keeps_token() {
        let user = CurrentUser {
            id: UserId::generate(),
            email: Email::parse("ana@exemplo.com").unwrap(),
            role: UserRole::Recycler,
            access_token: AccessToken::new("secret-token"),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "recycler");
        let back: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_session_context_clear() {
        let mut ctx = SessionContext::signed_in(CurrentUser {
            id: UserId::generate(),
            email: Email::parse("ana@exemplo.com").unwrap(),
            role: UserRole::Recycler,
            access_token: AccessToken::new("tok"),
        });
        assert!(ctx.is_authenticated());
        ctx.clear();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx, SessionContext::anonymous());
    }
}
