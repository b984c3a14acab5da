//! HTTP service around the extractor.

mod cors;
mod error;
mod handlers;

use std::path::PathBuf;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware, web};
use log::{info, warn};

use crate::config::Config;
use crate::convert::Extractor;

pub use cors::{OriginPolicy, build_cors};
pub use error::ApiError;

/// Read-only state shared by every worker
#[derive(Debug, Clone)]
pub struct AppState {
    pub extractor: Extractor,
    pub max_upload_bytes: usize,
    pub timeout: Option<Duration>,
    /// Parent of the per-upload scratch directories
    pub temp_root: Option<PathBuf>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let timeout_seconds = config.extraction.timeout_seconds;
        Self {
            extractor: Extractor::new(config.extraction.clone()),
            max_upload_bytes: config.limits.max_upload_bytes,
            timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
            temp_root: config.server.temp_dir.clone(),
        }
    }
}

/// Register the API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::convert);
}

/// Bind and serve until shutdown
pub async fn run(config: Config) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let policy = OriginPolicy::from_settings(&config.cors)?;
    let cors_settings = config.cors.clone();
    if policy.is_unconfigured() {
        warn!(
            "CORS: no allowed origins or origin regex configured, every origin is allowed{}",
            if cors_settings.allow_credentials { " with credentials" } else { "" }
        );
    }
    let state = web::Data::new(AppState::from_config(&config));

    info!("Starting HTTP server on {}", bind_addr);
    info!(
        "Server config: workers={}, max_upload={}MB, timeout={}s, cors_origins={:?}",
        if config.server.workers == 0 {
            "auto".to_string()
        } else {
            config.server.workers.to_string()
        },
        config.limits.max_upload_bytes / (1024 * 1024),
        config.extraction.timeout_seconds,
        config.cors.allowed_origins
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(build_cors(policy.clone(), &cors_settings))
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&bind_addr)?;

    let server = if config.server.workers > 0 {
        server.workers(config.server.workers)
    } else {
        server
    };

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
