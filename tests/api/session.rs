use serde_json::Value;

use crate::helpers::{mint_token, TestApp};

#[tokio::test]
async fn should_return_401_without_token() {
    let app = TestApp::new().await;

    let response = app.get("/api/session", None).await;
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn should_return_401_for_expired_or_malformed_token() {
    let app = TestApp::new().await;

    for token in [mint_token("parent", -10), "not.a.jwt".to_string()] {
        let response = app
            .get("/api/session", Some(&format!("access_token={}", token)))
            .await;
        assert_eq!(response.status(), 401);
    }
}

#[tokio::test]
async fn should_describe_live_session_from_cookie() {
    let app = TestApp::new().await;
    let token = mint_token("parent", 3600);

    let response = app
        .get("/api/session", Some(&format!("access_token={}", token)))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], "u1");
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["role"], "parent");
    assert_eq!(body["user"]["first_name"], "Ada");
    assert!(body["user"].get("last_name").is_none());

    let expires_in = body["expires_in"].as_u64().unwrap();
    assert!(expires_in > 3500 && expires_in <= 3600);
    assert_eq!(body["expiring_soon"], false);
}

#[tokio::test]
async fn should_flag_session_expiring_soon_from_bearer_header() {
    let app = TestApp::new().await;
    let token = mint_token("staff", 30);

    let response = app
        .http_client
        .get(app.url("/api/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "staff");
    assert_eq!(body["expiring_soon"], true);
}
