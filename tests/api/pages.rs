use serde_json::Value;

use crate::helpers::{cookie_value, location, mint_token, TestApp};

#[tokio::test]
async fn should_answer_health_check() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn should_redirect_to_login_without_session() {
    let app = TestApp::new().await;

    let response = app.get("/dashboard", None).await;
    assert_eq!(response.status(), 307);
    assert_eq!(location(&response).as_deref(), Some("/login?redirect=%2Fdashboard"));
}

#[tokio::test]
async fn should_preserve_locale_and_query_on_expired_session() {
    let app = TestApp::new().await;
    let expired = mint_token("parent", -10);

    let response = app
        .get(
            "/fr/daily-reports?day=monday",
            Some(&format!("access_token={}", expired)),
        )
        .await;
    assert_eq!(response.status(), 307);
    assert_eq!(
        location(&response).as_deref(),
        Some("/fr/login?redirect=%2Ffr%2Fdaily-reports%3Fday%3Dmonday")
    );
}

#[tokio::test]
async fn should_render_protected_page_for_live_session() {
    let app = TestApp::new().await;
    let token = mint_token("parent", 3600);

    let response = app
        .get("/fr/messages/42", Some(&format!("access_token={}", token)))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page"], "/messages/42");
    assert_eq!(body["locale"], "fr");
    assert_eq!(body["user"]["email"], "a@b.com");
}

#[tokio::test]
async fn should_enforce_role_rules() {
    let app = TestApp::new().await;

    let parent = mint_token("parent", 3600);
    let response = app
        .get("/admin", Some(&format!("access_token={}", parent)))
        .await;
    assert_eq!(response.status(), 307);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));

    let director = mint_token("director", 3600);
    let response = app
        .get("/admin", Some(&format!("access_token={}", director)))
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn should_send_signed_in_visitors_from_login_to_landing() {
    let app = TestApp::new().await;
    let token = mint_token("parent", 3600);

    let response = app
        .get("/login", Some(&format!("access_token={}", token)))
        .await;
    assert_eq!(response.status(), 307);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn should_localize_login_form_from_accept_language() {
    let app = TestApp::new().await;

    let response = app
        .http_client
        .get(app.url("/login?redirect=%2Fdocuments"))
        .header("accept-language", "fr-FR,fr;q=0.9,en;q=0.5")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(cookie_value(&response, "locale").as_deref(), Some("fr"));

    let html = response.text().await.unwrap();
    assert!(html.contains(r#"<html lang="fr">"#));
    assert!(html.contains(r#"name="redirect" value="/documents""#));
}

#[tokio::test]
async fn should_return_404_envelope_for_unknown_pages() {
    let app = TestApp::new().await;

    let response = app.get("/photo-gallery", None).await;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}
