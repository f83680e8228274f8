use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{Flow, Interceptor, RequestContext};
use crate::api::error::ApiError;
use crate::config::Config;
use crate::consts::CSRF_COOKIE_NAME;
use crate::cookies::{http_only_cookie, CookieOptions};
use crate::csrf::{cookie_options, generate_token, requires_protection, token_from_cookie, validate, CsrfToken};
use crate::routes::RouteTable;

/// Enforces the double-submit check on state-changing requests and issues a
/// token on GET requests that arrive without one.
pub struct CsrfInterceptor {
    routes: Arc<RouteTable>,
    cookie: CookieOptions,
    max_body_bytes: usize,
}

impl CsrfInterceptor {
    pub fn new(config: &Config, routes: Arc<RouteTable>) -> Self {
        Self {
            routes,
            cookie: cookie_options(config),
            max_body_bytes: config.csrf.max_body_bytes,
        }
    }
}

#[async_trait]
impl Interceptor for CsrfInterceptor {
    fn name(&self) -> &'static str {
        "csrf"
    }

    async fn intercept(&self, request: Request<Body>, ctx: &mut RequestContext) -> Flow {
        let method = request.method().clone();

        if requires_protection(method.as_str()) {
            let path = request.uri().path().to_owned();
            if self.routes.is_public_api(&path) {
                return Flow::Continue(request);
            }

            let (mut request, result) = validate(request, self.max_body_bytes).await;
            return match result {
                Ok(token) => {
                    request.extensions_mut().insert(CsrfToken(token));
                    Flow::Continue(request)
                }
                Err(e) => {
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        reason = e.kind(),
                        "CSRF validation failed"
                    );
                    Flow::Respond(ApiError::from(e).into_response())
                }
            };
        }

        let mut request = request;
        if method == Method::GET {
            let token = match token_from_cookie(request.headers()) {
                Some(existing) => existing,
                None => {
                    let token = generate_token();
                    ctx.add_cookie(http_only_cookie(CSRF_COOKIE_NAME, token.clone(), &self.cookie));
                    tracing::debug!(path = %request.uri().path(), "Issued CSRF token");
                    token
                }
            };
            request.extensions_mut().insert(CsrfToken(token));
        }

        Flow::Continue(request)
    }
}
