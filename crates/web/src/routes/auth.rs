//! Sign-in, registration and sign-out handlers.

use axum::{Json, extract::State, http::StatusCode};
use clique_recicle_core::{Email, UserId, UserRole};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use super::session_favorites;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Notice, SessionContext, session_keys};
use crate::services::auth::{AuthService, DEFAULT_LANDING, Registration};
use crate::services::forms::{LoginForm, RegistrationForm};
use crate::state::AppState;

/// The signed-in user as shown to the front end (no token).
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: Email,
    pub role: UserRole,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignedInResponse {
    pub user: UserView,
    pub redirect_to: &'static str,
    pub notice: Notice,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub email: Email,
    pub notice: Notice,
}

/// Body of `POST /cadastro`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    SignedIn(SignedInResponse),
    ConfirmationRequired(ConfirmationResponse),
}

/// Put the user in the session and warm their favorites.
async fn start_session(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
) -> Result<(), AppError> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    // Anything cached for the previous visitor belongs to them.
    session
        .remove::<serde_json::Value>(session_keys::FAVORITES)
        .await?;
    let ctx = SessionContext::signed_in(user.clone());
    let (_, notice) = session_favorites(state, session, &ctx).await?;
    if notice.is_some() {
        tracing::warn!(user_id = %user.id, "Favorites not cached at sign-in");
    }
    Ok(())
}

/// `POST /login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<SignedInResponse>, AppError> {
    let user = AuthService::new(state.auth(), state.gateway())
        .sign_in(&form)
        .await?;
    start_session(&state, &session, &user).await?;

    Ok(Json(SignedInResponse {
        user: UserView::from(&user),
        redirect_to: DEFAULT_LANDING,
        notice: Notice::success("Login realizado com sucesso!"),
    }))
}

/// `POST /cadastro`
///
/// 201 when the account is signed in straight away, 202 when the provider
/// wants the email confirmed first.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = AuthService::new(state.auth(), state.gateway())
        .register(&form)
        .await?;

    match registration {
        Registration::SignedIn { user, redirect_to } => {
            start_session(&state, &session, &user).await?;
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse::SignedIn(SignedInResponse {
                    user: UserView::from(&user),
                    redirect_to,
                    notice: Notice::success("Cadastro realizado com sucesso!"),
                })),
            ))
        }
        Registration::ConfirmationRequired { email } => Ok((
            StatusCode::ACCEPTED,
            Json(RegisterResponse::ConfirmationRequired(ConfirmationResponse {
                email,
                notice: Notice::success("Verifique seu email para confirmar o cadastro"),
            })),
        )),
    }
}

/// `POST /logout`
///
/// The local session is cleared even if the provider call fails.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(ctx): OptionalAuth,
) -> Result<StatusCode, AppError> {
    if let Some(user) = ctx.user() {
        AuthService::new(state.auth(), state.gateway())
            .sign_out(user)
            .await;
    }
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
