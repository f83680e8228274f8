use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use super::{Flow, Interceptor, RequestContext};
use crate::config::Config;
use crate::consts::ACCESS_TOKEN_COOKIE_NAME;
use crate::cookies::read_cookie;
use crate::routes::{strip_locale_prefix, RouteTable};
use crate::token::{get_validated_user, sanitize_for_logging, User};

/// The user behind a live session, attached to requests that passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub User);

/// Redirects visitors without a live session away from protected pages.
///
/// Only the token's own claims and the wall clock decide; there is no session
/// store to consult.
pub struct AuthGate {
    routes: Arc<RouteTable>,
    locales: Vec<String>,
}

impl AuthGate {
    pub fn new(config: &Config, routes: Arc<RouteTable>) -> Self {
        Self {
            routes,
            locales: config.i18n.locales.clone(),
        }
    }
}

fn redirect(to: &str) -> Flow {
    Flow::Respond(Redirect::temporary(to).into_response())
}

#[async_trait]
impl Interceptor for AuthGate {
    fn name(&self) -> &'static str {
        "auth_gate"
    }

    async fn intercept(&self, mut request: Request<Body>, _ctx: &mut RequestContext) -> Flow {
        let full_path = request.uri().path().to_owned();
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| full_path.clone());
        let (locale, path) = strip_locale_prefix(&full_path, &self.locales);

        let token = read_cookie(request.headers(), ACCESS_TOKEN_COOKIE_NAME);
        let is_page_view = *request.method() == Method::GET || *request.method() == Method::HEAD;

        if is_page_view && self.routes.is_login(path) {
            if token.as_deref().and_then(get_validated_user).is_some() {
                return redirect(&self.routes.landing(locale));
            }
            return Flow::Continue(request);
        }

        if !self.routes.is_protected(path) {
            return Flow::Continue(request);
        }

        let Some(user) = token.as_deref().and_then(get_validated_user) else {
            tracing::info!(
                path = %full_path,
                token = %sanitize_for_logging(token.as_deref()),
                "No live session, redirecting to login"
            );
            return redirect(&self.routes.login_redirect(locale, &path_and_query));
        };

        if let Some(roles) = self.routes.required_roles(path) {
            if !roles.iter().any(|role| *role == user.role) {
                tracing::warn!(
                    path = %full_path,
                    user_id = %user.id,
                    role = %user.role,
                    "Role not permitted on path"
                );
                return redirect(&self.routes.landing(locale));
            }
        }

        request.extensions_mut().insert(SessionUser(user));
        Flow::Continue(request)
    }
}
