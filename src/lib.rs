pub mod api;
pub mod config;
pub mod consts;
pub mod cookies;
pub mod csrf;
pub mod pipeline;
pub mod routes;
pub mod token;

use config::Config;
use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::routes::RouteTable;

pub struct AppState {
    pub config: Config,
    pub routes: Arc<RouteTable>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let routes = Arc::new(RouteTable::from_config(&config.routes));
        let pipeline = Pipeline::standard(&config, routes.clone());
        Self {
            config,
            routes,
            pipeline,
        }
    }

    /// Replace the standard interceptor chain
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }
}
