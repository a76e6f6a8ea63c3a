//! Reagent consumption forecasting
//!
//! Fits a trend per reagent on its consumption history, aggregates the
//! projection by month and stores monthly predictions plus a summary per
//! reagent, one atomic batch per run.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod ml;
pub mod models;
pub mod repositories;
pub mod services;

use axum::Router;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::forecasting::ForecastingService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub forecasting: Arc<ForecastingService>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let forecasting = Arc::new(ForecastingService::new(db.clone(), config.forecast));
        Self {
            db,
            config,
            forecasting,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new().nest("/forecasts", handlers::forecasts::forecast_routes())
}

/// Full application router with request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(handlers::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
