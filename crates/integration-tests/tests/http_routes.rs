//! The full router over the in-memory backend, one request at a time.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use clique_recicle_core::{UserId, UserRole};
use clique_recicle_integration_tests::{TestApp, point};

fn seeded_app() -> TestApp {
    let app = TestApp::new();
    let agent = UserId::generate();
    app.backend
        .seed_point(point("EcoPoint Centro", "São Paulo", &["Papel", "Vidro"], agent, 0));
    app.backend
        .seed_point(point("Recicladora Verde", "São Paulo", &["Plástico", "Metal"], agent, 1));
    app
}

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::new();
    assert_eq!(app.get("/health").await.status, StatusCode::OK);
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);

    app.backend.set_fail_reads(true);
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_static_pages() {
    let mut app = TestApp::new();
    let home = app.get("/").await;
    assert_eq!(home.body["call_to_action"]["href"], "/locais");
    let about = app.get("/sobre").await;
    assert_eq!(about.body["title"], "CLIQUE & RECICLE");
    let tips = app.get("/dicas").await;
    assert_eq!(tips.body["materials"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let mut app = TestApp::new();
    let response = app.get("/nao-existe").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"]["kind"], "error");
}

#[tokio::test]
async fn test_search_filters_cards_and_is_remembered() {
    let mut app = seeded_app();

    let page = app.get("/locais?q=verde").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["heading"], "Pontos de Coleta Disponíveis (1)");
    assert_eq!(page.body["cards"][0]["name"], "Recicladora Verde");
    assert_eq!(page.body["cards"][0]["is_favorite"], false);
    assert_eq!(page.body["pager"]["show"], false);

    // The next visit without a query keeps the stored search.
    let again = app.get("/locais").await;
    assert_eq!(again.body["query"], "verde");
    assert_eq!(again.body["cards"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_search_shows_message() {
    let mut app = seeded_app();
    let page = app.get("/locais?q=bateria").await;
    assert_eq!(
        page.body["empty_message"],
        "Nenhum ponto de coleta encontrado para sua busca."
    );
    assert_eq!(page.body["pager"]["total_pages"], 0);
}

#[tokio::test]
async fn test_failed_listing_degrades_to_notice() {
    let mut app = seeded_app();
    app.backend.set_fail_reads(true);

    let page = app.get("/locais").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body["cards"].as_array().unwrap().is_empty());
    assert_eq!(
        page.body["notices"][0]["message"],
        "Erro ao carregar pontos de coleta"
    );
}

#[tokio::test]
async fn test_signed_out_toggle_is_refused() {
    let mut app = seeded_app();
    let list = app.get("/locais").await;
    let id = list.body["cards"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .send(Method::POST, &format!("/locais/{id}/favorito"), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"]["message"], "Você precisa estar logado");
    assert_eq!(app.backend.favorite_rows(), 0);
}

#[tokio::test]
async fn test_toggle_favorite_round_trip() {
    let mut app = seeded_app();
    app.login_as("maria@example.com", UserRole::Recycler).await;
    let list = app.get("/locais").await;
    let id = list.body["cards"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/locais/{id}/favorito");

    let added = app.send(Method::POST, &uri, None).await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["is_favorite"], true);
    let listed = app.get("/locais").await;
    assert_eq!(listed.body["cards"][0]["is_favorite"], true);

    let removed = app.send(Method::POST, &uri, None).await;
    assert_eq!(removed.body["is_favorite"], false);
    assert_eq!(app.backend.favorite_rows(), 0);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let mut app = TestApp::new();
    app.login_as("ana@example.com", UserRole::Recycler).await;
    app.send(Method::POST, "/logout", None).await;

    let response = app
        .post(
            "/login",
            json!({ "email": "ana@example.com", "password": "errada" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.get("/dashboard").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_agent_registration_lands_on_onboarding() {
    let mut app = TestApp::new();
    let response = app
        .post(
            "/cadastro",
            json!({
                "name": "Carlos Agente",
                "email": "carlos@example.com",
                "cpf": "123.456.789-00",
                "password": "segredo123",
                "confirmPassword": "segredo123",
                "userType": "agent"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["redirect_to"], "/agent-onboarding");
    assert_eq!(response.body["user"]["role"], "agent");

    let form = app.get("/agent-onboarding").await;
    assert_eq!(form.body["form"]["startHour"], "06:00");
    assert_eq!(form.body["max_images"], 4);
}

#[tokio::test]
async fn test_registration_with_mismatched_passwords() {
    let mut app = TestApp::new();
    let response = app
        .post(
            "/cadastro",
            json!({
                "name": "Bia",
                "email": "bia@example.com",
                "cpf": "123",
                "password": "segredo123",
                "confirmPassword": "segredo124"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"]["message"], "As senhas não coincidem");
}

#[tokio::test]
async fn test_onboarding_rejects_five_photos() {
    let mut app = TestApp::new();
    app.login_as("novo@example.com", UserRole::Agent).await;
    let images: Vec<_> = (1..=5)
        .map(|i| json!({ "fileName": format!("{i}.png"), "contentType": "image/png", "data": "iVBORw0K" }))
        .collect();

    let response = app
        .post(
            "/agent-onboarding",
            json!({
                "name": "Ponto Verde",
                "cep": "13010-000",
                "state": "SP",
                "city": "Campinas",
                "bairro": "Centro",
                "rua": "Rua Barão de Jaguara, 900",
                "materials": ["Vidro"],
                "phone": "(19) 3333-0000",
                "images": images
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["error"]["message"],
        "Você pode adicionar no máximo 4 fotos"
    );
    assert_eq!(app.backend.write_count(), 0);
}

#[tokio::test]
async fn test_onboarding_creates_point() {
    let mut app = TestApp::new();
    app.login_as("novo@example.com", UserRole::Agent).await;

    let response = app
        .post(
            "/agent-onboarding",
            json!({
                "name": "Ponto Verde",
                "cep": "13010-000",
                "state": "SP",
                "city": "Campinas",
                "bairro": "Centro",
                "rua": "Rua Barão de Jaguara, 900",
                "materials": ["Vidro", "Tecido"],
                "whatsapp": "(19) 99999-0000"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["message"], "Ponto de coleta cadastrado com sucesso!");
    assert_eq!(response.body["point"]["materials"], json!(["Vidro", "Tecido"]));
}

#[tokio::test]
async fn test_onboarding_accepts_phone_sized_photo() {
    let mut app = TestApp::new();
    app.login_as("novo@example.com", UserRole::Agent).await;
    // "AAAA" decodes to three zero bytes, so this is a 3 MiB photo.
    let data = "A".repeat(4 * 1024 * 1024);

    let response = app
        .post(
            "/agent-onboarding",
            json!({
                "name": "Ponto Verde",
                "cep": "13010-000",
                "state": "SP",
                "city": "Campinas",
                "bairro": "Centro",
                "rua": "Rua Barão de Jaguara, 900",
                "materials": ["Vidro"],
                "phone": "(19) 3333-0000",
                "images": [{ "fileName": "fachada.png", "contentType": "image/png", "data": data }]
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body["error"]);
    assert_eq!(response.body["image_urls"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_signed_out_onboarding_is_refused_before_photos() {
    let mut app = TestApp::new();
    let images: Vec<_> = (1..=5)
        .map(|i| json!({ "fileName": format!("{i}.png"), "contentType": "image/png", "data": "iVBORw0K" }))
        .collect();

    let response = app
        .post(
            "/agent-onboarding",
            json!({
                "name": "Ponto Verde",
                "cep": "13010-000",
                "state": "SP",
                "city": "Campinas",
                "bairro": "Centro",
                "rua": "Rua Barão de Jaguara, 900",
                "materials": ["Vidro"],
                "images": images
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.backend.call_count(), 0);
}

#[tokio::test]
async fn test_dashboard_create_then_delete() {
    let mut app = TestApp::new();
    app.login_as("agente@example.com", UserRole::Agent).await;

    let created = app
        .post(
            "/dashboard/pontos",
            json!({
                "name": "Cooperativa",
                "address": "Rua A, 1",
                "city": "Santos",
                "state": "SP",
                "materials": "Papel, Plástico",
                "hours": "8h-17h",
                "phone": "(13) 3000-0000"
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["notice"]["kind"], "success");
    assert_eq!(created.body["points"].as_array().unwrap().len(), 1);
    let id = created.body["point"]["id"].as_str().unwrap().to_string();

    let dashboard = app.get("/dashboard").await;
    assert_eq!(dashboard.body["is_agent"], true);
    assert_eq!(dashboard.body["points"][0]["materials"], json!(["Papel", "Plástico"]));

    let deleted = app
        .send(Method::DELETE, &format!("/dashboard/pontos/{id}"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.body["notice"]["message"],
        "Ponto de coleta excluído com sucesso!"
    );
    assert!(deleted.body["points"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recycler_cannot_use_agent_dashboard_writes() {
    let mut app = TestApp::new();
    app.login_as("reciclador@example.com", UserRole::Recycler).await;

    let response = app
        .post("/dashboard/pontos", json!({ "name": "X" }))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    let dashboard = app.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["is_agent"], false);
}

#[tokio::test]
async fn test_remove_favorite_from_dashboard() {
    let mut app = seeded_app();
    app.login_as("rui@example.com", UserRole::Recycler).await;
    let list = app.get("/locais").await;
    let id = list.body["cards"][1]["id"].as_str().unwrap().to_string();
    app.send(Method::POST, &format!("/locais/{id}/favorito"), None)
        .await;

    let dashboard = app.get("/dashboard").await;
    let favorite_id = dashboard.body["favorites"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let removed = app
        .send(Method::DELETE, &format!("/dashboard/favoritos/{favorite_id}"), None)
        .await;

    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["notice"]["message"], "Favorito removido!");
    assert!(removed.body["favorites"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let mut app = TestApp::new();
    let mut statuses = Vec::new();
    for _ in 0..8 {
        let response = app
            .post(
                "/login",
                json!({ "email": "ninguem@example.com", "password": "segredo123" }),
            )
            .await;
        statuses.push(response.status);
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}
