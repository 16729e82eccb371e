//! Dashboard and onboarding forms against the in-memory backend.

#![allow(clippy::unwrap_used)]

use clique_recicle_core::{DraftError, UserRole};
use clique_recicle_integration_tests::signed_in;
use clique_recicle_web::gateway::InMemoryBackend;
use clique_recicle_web::models::SessionContext;
use clique_recicle_web::services::forms::{
    CollectionPointForm, FormError, OnboardingController, OnboardingForm, PointEditor,
};
use clique_recicle_web::services::uploads::{ImageFile, InlineUploader};

fn dashboard_form() -> CollectionPointForm {
    CollectionPointForm {
        name: "Cooperativa Bairro Novo".to_string(),
        address: "Rua das Palmeiras, 45".to_string(),
        city: "Campinas".to_string(),
        state: "SP".to_string(),
        zip_code: String::new(),
        materials: "Papel, Plástico".to_string(),
        hours: "Seg-Sex: 8h-17h".to_string(),
        phone: "(19) 3333-4444".to_string(),
    }
}

fn onboarding_form() -> OnboardingForm {
    let mut form = OnboardingForm::default();
    form.name = "Ponto Verde".to_string();
    form.cep = "13010-000".to_string();
    form.state = "SP".to_string();
    form.city = "Campinas".to_string();
    form.bairro = "Centro".to_string();
    form.rua = "Rua Barão de Jaguara, 900".to_string();
    form.whatsapp = "(19) 99999-0000".to_string();
    form.email = "contato@pontoverde.example".to_string();
    form.toggle_material("Vidro").unwrap();
    form
}

fn photo(name: &str) -> ImageFile {
    ImageFile {
        file_name: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    }
}

#[tokio::test]
async fn test_agent_creates_point_with_ordered_materials() {
    let backend = InMemoryBackend::new();
    let agent = signed_in(&backend, "agente@example.com", UserRole::Agent);
    let editor = PointEditor::new(&backend);

    let created = editor.create(&agent, &dashboard_form()).await.unwrap();

    assert_eq!(backend.write_count(), 1);
    assert_eq!(created.materials, ["Papel", "Plástico"]);
    assert_eq!(created.zip_code, None);
    let mine = editor.list_mine(&agent).await.unwrap();
    assert_eq!(mine.iter().map(|p| p.id).collect::<Vec<_>>(), [created.id]);
}

#[tokio::test]
async fn test_recycler_cannot_create_points() {
    let backend = InMemoryBackend::new();
    let recycler = signed_in(&backend, "reciclador@example.com", UserRole::Recycler);

    let err = PointEditor::new(&backend)
        .create(&recycler, &dashboard_form())
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::Forbidden(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_blank_materials_are_rejected_without_a_call() {
    let backend = InMemoryBackend::new();
    let agent = signed_in(&backend, "agente@example.com", UserRole::Agent);
    let form = CollectionPointForm {
        materials: " , ,".to_string(),
        ..dashboard_form()
    };

    let err = PointEditor::new(&backend).create(&agent, &form).await.unwrap_err();

    assert!(matches!(err, FormError::Draft(DraftError::NoMaterials)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_agent_cannot_edit_another_agents_point() {
    let backend = InMemoryBackend::new();
    let owner = signed_in(&backend, "dona@example.com", UserRole::Agent);
    let other = signed_in(&backend, "outro@example.com", UserRole::Agent);
    let editor = PointEditor::new(&backend);
    let created = editor.create(&owner, &dashboard_form()).await.unwrap();

    let update = editor.update(&other, created.id, &dashboard_form()).await;
    assert!(matches!(update, Err(FormError::Forbidden(_))));
    let delete = editor.delete(&other, created.id).await;
    assert!(matches!(delete, Err(FormError::Forbidden(_))));
    assert_eq!(backend.write_count(), 1);
}

#[tokio::test]
async fn test_agent_updates_and_deletes_own_point() {
    let backend = InMemoryBackend::new();
    let agent = signed_in(&backend, "agente@example.com", UserRole::Agent);
    let editor = PointEditor::new(&backend);
    let created = editor.create(&agent, &dashboard_form()).await.unwrap();

    let mut form = CollectionPointForm::from_point(&created);
    form.materials = "Metal, Vidro, Papel".to_string();
    let updated = editor.update(&agent, created.id, &form).await.unwrap();
    assert_eq!(updated.materials, ["Metal", "Vidro", "Papel"]);

    editor.delete(&agent, created.id).await.unwrap();
    assert!(editor.list_mine(&agent).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_onboarding_inserts_derived_point() {
    let backend = InMemoryBackend::new();
    let agent = signed_in(&backend, "novo@example.com", UserRole::Agent);
    let mut form = onboarding_form();
    form.attach_images([photo("fachada.png")]).unwrap();

    let outcome = OnboardingController::new(&backend, &InlineUploader)
        .submit(&agent, &form)
        .await
        .unwrap();

    assert_eq!(backend.write_count(), 1);
    assert_eq!(outcome.redirect_to, "/");
    assert_eq!(outcome.point.address, "Rua Barão de Jaguara, 900, Centro");
    assert_eq!(outcome.point.hours, "06:00 - 18:00");
    assert_eq!(outcome.point.phone, "(19) 99999-0000");
    assert_eq!(outcome.point.zip_code.as_deref(), Some("13010-000"));
    assert_eq!(outcome.image_urls.len(), 1);
    assert!(outcome.image_urls.iter().all(|url| url.starts_with("data:image/png;base64,")));
}

#[tokio::test]
async fn test_onboarding_rejects_fifth_image() {
    let mut form = onboarding_form();
    form.attach_images((1..=4).map(|i| photo(&format!("{i}.png")))).unwrap();

    let err = form.attach_images([photo("5.png")]).unwrap_err();

    assert!(matches!(err, FormError::TooManyImages { max: 4 }));
    assert_eq!(form.images().len(), 4);
}

#[tokio::test]
async fn test_onboarding_without_materials_makes_no_call() {
    let backend = InMemoryBackend::new();
    let agent = signed_in(&backend, "novo@example.com", UserRole::Agent);
    let mut form = onboarding_form();
    form.toggle_material("Vidro").unwrap();

    let err = OnboardingController::new(&backend, &InlineUploader)
        .submit(&agent, &form)
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::Draft(DraftError::NoMaterials)));
    assert_eq!(backend.call_count(), 0);
    assert_eq!(form.name, "Ponto Verde");
}

#[tokio::test]
async fn test_onboarding_requires_a_session() {
    let backend = InMemoryBackend::new();

    let err = OnboardingController::new(&backend, &InlineUploader)
        .submit(&SessionContext::anonymous(), &onboarding_form())
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::AuthRequired));
    assert_eq!(backend.call_count(), 0);
}
