use jsonwebtoken::{encode, EncodingKey, Header};
use portal_gate::api::create_router;
use portal_gate::config::Config;
use portal_gate::AppState;
use reqwest::{redirect::Policy, Client, Response};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::spawn;

pub struct TestApp {
    pub address: String,
    pub http_client: Client,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        Self::with_state(AppState::new(config)).await
    }

    pub async fn with_state(state: AppState) -> Self {
        let state = Arc::new(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed binding to an ephemeral port");

        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server = axum::serve(listener, create_router(state));

        spawn(async move {
            if let Err(e) = server.await {
                eprintln!("Test server error: {}", e);
            }
        });

        // Redirects are part of what we assert on
        let http_client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build http client");

        TestApp {
            address,
            http_client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str, cookies: Option<&str>) -> Response {
        let mut request = self.http_client.get(self.url(path));
        if let Some(cookies) = cookies {
            request = request.header("cookie", cookies);
        }
        request.send().await.expect("Failed to execute GET request.")
    }

    /// Fetch a fresh CSRF token the way the browser client does
    pub async fn fetch_csrf(&self) -> String {
        let response = self.get("/api/csrf", None).await;
        assert_eq!(response.status(), 200);

        let cookie = cookie_value(&response, "csrf_token").expect("csrf cookie not issued");
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["csrf_token"], cookie.as_str());
        cookie
    }

    pub async fn logout(&self, cookies: Option<&str>, csrf_header: Option<&str>) -> Response {
        let mut request = self.http_client.post(self.url("/api/auth/logout"));
        if let Some(cookies) = cookies {
            request = request.header("cookie", cookies);
        }
        if let Some(token) = csrf_header {
            request = request.header("x-csrf-token", token);
        }
        request.send().await.expect("Failed to execute logout request.")
    }
}

/// A bearer token with the given role expiring `exp_offset` seconds from now
pub fn mint_token(role: &str, exp_offset: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({
            "sub": "u1",
            "email": "a@b.com",
            "role": role,
            "firstName": "Ada",
            "iat": now,
            "exp": now + exp_offset,
        }),
        &EncodingKey::from_secret(b"backend-signing-key"),
    )
    .expect("Failed to mint token")
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(response).into_iter().find_map(|header| {
        header
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix(&prefix))
            .map(str::to_owned)
    })
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get("location")
        .map(|v| v.to_str().unwrap().to_owned())
}
