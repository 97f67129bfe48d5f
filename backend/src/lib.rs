//! Milk Quality Platform - Backend
//!
//! HTTP JSON service over the UOM conversion and FAT/SNF aggregation core,
//! for the ERP's purchase receipt, stock entry, work order and BOM forms.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;
pub use repository::Repositories;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repos: Repositories, config: Config) -> Self {
        Self {
            repos,
            config: Arc::new(config),
        }
    }

    pub fn uom_service(&self) -> services::UomService {
        services::UomService::new(self.repos.clone())
    }

    pub fn quality_service(&self) -> services::QualityService {
        services::QualityService::new(self.repos.clone())
    }

    pub fn document_service(&self) -> services::DocumentService {
        services::DocumentService::new(
            self.repos.clone(),
            self.config.documents.stale_policy,
            self.config.documents.uom_clear_delay_ms,
        )
    }

    pub fn ledger_service(&self) -> services::LedgerService {
        services::LedgerService::new(self.repos.clone(), self.config.milk.litre_uom.clone())
    }

    pub fn pricing_service(&self) -> services::PricingService {
        services::PricingService::new(self.repos.clone(), self.config.milk.kg_per_litre)
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Milk Quality Platform API v1.0"
}
