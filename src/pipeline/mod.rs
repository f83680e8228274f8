//! Ordered request interceptors run in front of every handler.
//!
//! Each interceptor either hands the (possibly modified) request to the next
//! one or ends the request with its own response. Cookies queued on the
//! [`RequestContext`] are written onto the handler's response; a short-circuit
//! response discards them, so a refused request never changes browser state.

mod auth_gate;
mod csrf;
mod locale;

pub use auth_gate::{AuthGate, SessionUser};
pub use csrf::CsrfInterceptor;
pub use locale::{negotiate_accept_language, Locale, LocaleInterceptor};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::config::Config;
use crate::routes::RouteTable;
use crate::AppState;

/// Outcome of a single interceptor
pub enum Flow {
    Continue(Request<Body>),
    Respond(Response),
}

/// Per-request scratch space shared by the interceptors
#[derive(Debug, Default)]
pub struct RequestContext {
    cookies: CookieJar,
}

impl RequestContext {
    /// Queue a cookie for the handler's response
    pub fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookies = std::mem::take(&mut self.cookies).add(cookie);
    }

    pub fn pending_cookies(&self) -> &CookieJar {
        &self.cookies
    }

    fn finish(self, response: Response) -> Response {
        (self.cookies, response).into_response()
    }
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Label used in logs
    fn name(&self) -> &'static str;

    async fn intercept(&self, request: Request<Body>, ctx: &mut RequestContext) -> Flow;
}

#[derive(Default, Clone)]
pub struct Pipeline {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; interceptors run in insertion order
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Locale detection, then CSRF enforcement, then the auth gate
    pub fn standard(config: &Config, routes: Arc<RouteTable>) -> Self {
        Self::new()
            .with(LocaleInterceptor::new(config))
            .with(CsrfInterceptor::new(config, routes.clone()))
            .with(AuthGate::new(config, routes))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub async fn run(&self, request: Request<Body>, next: Next) -> Response {
        let mut ctx = RequestContext::default();
        let mut request = request;

        for interceptor in &self.interceptors {
            match interceptor.intercept(request, &mut ctx).await {
                Flow::Continue(next_request) => request = next_request,
                Flow::Respond(response) => {
                    tracing::debug!(
                        interceptor = interceptor.name(),
                        status = %response.status(),
                        "Request short-circuited"
                    );
                    return response;
                }
            }
        }

        let response = next.run(request).await;
        ctx.finish(response)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("interceptors", &self.names())
            .finish()
    }
}

/// axum middleware entry point for the configured pipeline
pub async fn pipeline_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    state.pipeline.run(request, next).await
}
