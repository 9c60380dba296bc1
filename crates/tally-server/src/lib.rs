//! Tally Dashboard Server
//!
//! Axum-based JSON API that feeds the dashboard front-end. A client uploads
//! a transaction file, then queries filtered views, aggregate reports and the
//! balance outlook with explicit filter parameters on every request.
//!
//! The dataset is held in process memory only. Uploading a new file replaces
//! it, or merges into it with `?merge=true`.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use tally_core::{Config, Dataset};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries and part headers around the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Filter and report defaults
    pub app: Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl ServerConfig {
    pub fn from_config(app: Config) -> Self {
        Self {
            host: app.server.host.clone(),
            port: app.server.port,
            allowed_origins: Vec::new(),
            app,
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    dataset: RwLock<Option<Dataset>>,
    pub config: Config,
}

impl AppState {
    pub fn new(dataset: Option<Dataset>, config: Config) -> Self {
        Self {
            dataset: RwLock::new(dataset),
            config,
        }
    }

    pub(crate) fn read_dataset(&self) -> Result<RwLockReadGuard<'_, Option<Dataset>>, AppError> {
        self.dataset
            .read()
            .map_err(|_| AppError::internal("Dataset lock poisoned"))
    }

    pub(crate) fn write_dataset(&self) -> Result<RwLockWriteGuard<'_, Option<Dataset>>, AppError> {
        self.dataset
            .write()
            .map_err(|_| AppError::internal("Dataset lock poisoned"))
    }
}

/// Health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub loaded: bool,
}

/// Create the application router
pub fn create_router(dataset: Option<Dataset>, config: ServerConfig) -> Router {
    let state = Arc::new(AppState::new(dataset, config.app.clone()));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Dataset
        .route(
            "/dataset",
            get(handlers::get_dataset)
                .post(handlers::upload_dataset)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MULTIPART_OVERHEAD)),
        )
        // Views and reports
        .route("/transactions", get(handlers::list_transactions))
        .route("/report", get(handlers::get_report))
        .route("/report/averages", get(handlers::get_category_averages))
        .route("/outlook", get(handlers::get_outlook));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server with custom configuration
pub async fn serve_with_config(dataset: Option<Dataset>, config: ServerConfig) -> anyhow::Result<()> {
    match &dataset {
        Some(data) => info!("Serving {} transactions", data.len()),
        None => info!("No dataset loaded yet; upload one via POST /api/dataset"),
    }

    let addr = format!("{}:{}", config.host, config.port);
    let app = create_router(dataset, config);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Malformed input is the caller's fault; anything else is ours
    pub fn from_core(err: tally_core::Error) -> Self {
        if err.is_load_error() {
            Self::bad_request(&err.to_string())
        } else {
            err.into()
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
