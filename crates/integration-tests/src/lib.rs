//! Integration tests for Clique & Recicle.
//!
//! Everything runs in-process against the in-memory backend: controllers
//! are driven directly, and the full router is exercised with
//! `tower::ServiceExt::oneshot`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p clique-recicle-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use clique_recicle_core::{CollectionPoint, CollectionPointId, Email, UserId, UserRole};
use clique_recicle_web::config::WebConfig;
use clique_recicle_web::gateway::{AuthSession, InMemoryBackend};
use clique_recicle_web::models::{CurrentUser, SessionContext};
use clique_recicle_web::routes;
use clique_recicle_web::state::AppState;

/// Configuration for the in-memory backend with the default page size.
#[must_use]
pub fn memory_config() -> WebConfig {
    WebConfig::from_vars(&|key| (key == "CLIQUE_BACKEND").then(|| "memory".to_string())).unwrap()
}

/// A collection point created `age_minutes` before a fixed instant, so a
/// larger age sorts later in newest-first listings.
#[must_use]
pub fn point(name: &str, city: &str, materials: &[&str], agent_id: UserId, age_minutes: i64) -> CollectionPoint {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    CollectionPoint {
        id: CollectionPointId::generate(),
        name: name.to_string(),
        address: format!("Rua {name}, 100"),
        city: city.to_string(),
        state: "SP".to_string(),
        zip_code: None,
        phone: "(11) 1234-5678".to_string(),
        hours: "Seg-Sex: 8h-18h".to_string(),
        materials: materials.iter().map(|m| (*m).to_string()).collect(),
        agent_id,
        created_at: base - Duration::minutes(age_minutes),
    }
}

/// Register an account on `backend` and return its signed-in context.
#[must_use]
pub fn signed_in(backend: &InMemoryBackend, email: &str, role: UserRole) -> SessionContext {
    let session: AuthSession = backend.seed_account(&Email::parse(email).unwrap(), "segredo123", role);
    SessionContext::signed_in(CurrentUser::from_auth(session, role))
}

/// The full router over a fresh in-memory backend.
pub struct TestApp {
    pub backend: Arc<InMemoryBackend>,
    router: Router,
    cookie: Option<String>,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let state = AppState::with_backend(memory_config(), backend.clone(), backend.clone());
        Self {
            backend,
            router: routes::app(state),
            cookie: None,
        }
    }

    /// Send a request, carrying the session cookie from earlier responses.
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Register an account on the backend and sign in through `/login`.
    pub async fn login_as(&mut self, email: &str, role: UserRole) -> UserId {
        let session = self
            .backend
            .seed_account(&Email::parse(email).unwrap(), "segredo123", role);
        let response = self
            .post(
                "/login",
                serde_json::json!({ "email": email, "password": "segredo123" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        session.user.id
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
