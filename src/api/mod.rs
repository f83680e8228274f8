pub mod error;
pub mod pages;
pub mod session;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::pipeline::pipeline_middleware;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/csrf", get(session::csrf_token))
        .route("/session", get(session::current_session))
        .route("/auth/logout", post(session::logout));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        // Login form and protected sections are resolved from the route table
        .fallback(pages::render)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    pipeline_middleware,
                )),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
