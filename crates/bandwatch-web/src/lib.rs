//! # Bandwatch Web
//!
//! HTTP surface for the fetch–analyze–merge pipeline.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /api/data` | Merged price and support-range series as JSON |
//! | `/*` | Static chart frontend, when `--static-dir` is set |
//!
//! Successful responses carry `x-request-id` and `x-row-diagnostics` (the
//! number of tolerated malformed rows). Failures are plain text with an
//! `x-error-code` header naming the failure kind.

pub mod config;
pub mod error;
mod handler;

use std::path::Path;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use bandwatch_core::{Pipeline, StepRunner};
use time::Date;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::ServerArgs;
pub use error::ServerError;
pub use handler::{DataQuery, ERROR_CODE_HEADER, REQUEST_ID_HEADER, ROW_DIAGNOSTICS_HEADER};

/// Shared handler state.
pub struct AppState<R> {
    pub pipeline: Arc<Pipeline<R>>,
    /// Fixed window end; `None` uses today's date for every request.
    pub end_date: Option<Date>,
}

impl<R> AppState<R> {
    pub fn new(pipeline: Pipeline<R>, end_date: Option<Date>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            end_date,
        }
    }
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            end_date: self.end_date,
        }
    }
}

/// Builds the application router.
pub fn router<R: StepRunner + 'static>(state: AppState<R>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/api/data", get(handler::get_data::<R>))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Installs the global `fmt` subscriber. An explicit filter wins over
/// `RUST_LOG`; without either, `info` is used.
pub fn init_tracing(filter: Option<&str>) -> Result<(), ServerError> {
    let env_filter = match filter {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|error| ServerError::LogFilter {
                filter: directives.to_owned(),
                message: error.to_string(),
            })?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|error| ServerError::Logging(error.to_string()))
}
