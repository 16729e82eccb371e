//! Request and response bodies exchanged with PostgREST and GoTrue.

use serde::{Deserialize, Serialize};

use clique_recicle_core::{CollectionPointId, Email, UserId, UserRole};

use crate::gateway::AuthUser;

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
pub struct PostgrestError {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

/// Error body returned by GoTrue (field names vary between versions).
#[derive(Debug, Deserialize)]
pub struct GoTrueError {
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error_description: Option<String>,
    pub error: Option<String>,
}

/// Pull the most specific human-readable message out of an error body.
pub fn error_message(body: &str) -> Option<String> {
    if let Ok(err) = serde_json::from_str::<PostgrestError>(body)
        && let Some(message) = err.message
    {
        return Some(match err.details {
            Some(details) if !details.is_empty() => format!("{message} ({details})"),
            _ => message,
        });
    }

    let err = serde_json::from_str::<GoTrueError>(body).ok()?;
    err.msg
        .or(err.message)
        .or(err.error_description)
        .or(err.error)
}

/// PostgREST reports unique violations with SQLSTATE 23505.
pub fn is_unique_violation(body: &str) -> bool {
    serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|e| e.code)
        .is_some_and(|code| code == "23505")
}

/// Insert body for the `favorites` table.
#[derive(Debug, Serialize)]
pub struct FavoriteInsert {
    pub user_id: UserId,
    pub collection_point_id: CollectionPointId,
}

/// Row of the `user_roles` table.
#[derive(Debug, Deserialize)]
pub struct RoleRow {
    pub role: String,
}

/// Metadata attached to an auth user at sign-up.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

/// `POST /auth/v1/signup` body.
#[derive(Debug, Serialize)]
pub struct SignUpBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: UserMetadata,
}

/// `POST /auth/v1/token?grant_type=password` body.
#[derive(Debug, Serialize)]
pub struct PasswordGrantBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// User object returned by GoTrue.
#[derive(Debug, Deserialize)]
pub struct GoTrueUser {
    pub id: UserId,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}

impl GoTrueUser {
    /// Convert into the provider-neutral identity.
    ///
    /// Returns `None` when the provider sent no usable email.
    pub fn into_auth_user(self) -> Option<AuthUser> {
        let email = Email::parse(self.email.as_deref()?).ok()?;
        let role_hint = self
            .user_metadata
            .and_then(|m| m.user_type)
            .and_then(|t| t.parse::<UserRole>().ok());
        Some(AuthUser {
            id: self.id,
            email,
            role_hint,
        })
    }
}

/// Session object returned by GoTrue.
#[derive(Debug, Deserialize)]
pub struct GoTrueSession {
    pub access_token: String,
    pub user: GoTrueUser,
}

/// `signup` answers with a session when autoconfirm is on, a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}
