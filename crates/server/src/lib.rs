//! Ledgerlight web server
//!
//! Axum REST API over the import pipeline: CSV preview and confirmation,
//! category suggestions, and the learning cache.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

use ledgerlight_import::{
    CategorizationEngine, JsonFileStore, LearningCache, MerchantMatcher, PatternStore,
};

pub mod config;
mod handlers;

pub use config::ServerConfig;

pub type SharedStore = Box<dyn PatternStore + Send>;
pub type Engine = CategorizationEngine<SharedStore>;

/// Shared application state
pub struct AppState {
    /// Imports are serialised through this lock.
    pub engine: Mutex<Engine>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(engine: Engine, config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            engine: Mutex::new(engine),
            config,
        })
    }

    /// Engine backed by `<data_dir>/<learning_cache_file>`.
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let merchants = config.merchant_matcher()?;
        let store: SharedStore = Box::new(JsonFileStore::new(config.data_dir.clone()));
        Ok(Self::with_store(store, merchants, config))
    }

    pub fn with_store(
        store: SharedStore,
        merchants: MerchantMatcher,
        config: ServerConfig,
    ) -> Arc<Self> {
        let cache = LearningCache::with_key(store, &config.learning_cache_file);
        let mut engine = CategorizationEngine::new(cache, merchants);
        let learned = engine.cache_mut().load();
        info!(
            merchants = engine.merchants().len(),
            learned,
            "Categorization engine ready"
        );
        Self::new(engine, config)
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let limit = state.config.max_upload_bytes;

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/bank-formats", get(handlers::list_bank_formats))
        .route("/categories", get(handlers::list_categories))
        // Import
        .route("/import/preview", post(handlers::preview_import))
        .route("/import/confirm", post(handlers::confirm_import))
        .route("/import/duplicates", post(handlers::override_duplicate))
        // Categorization
        .route("/categorize/suggest", post(handlers::suggest_category))
        .route("/categorize/transaction", post(handlers::categorize_transaction))
        .route("/categorize/score", post(handlers::score_category))
        .route("/transactions/similar", post(handlers::find_similar))
        .route("/transactions/apply-similar", post(handlers::apply_similar))
        // Learning cache
        .route("/learning/corrections", post(handlers::record_correction))
        .route(
            "/learning/patterns",
            get(handlers::list_patterns).delete(handlers::clear_patterns),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
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
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
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
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }
}
