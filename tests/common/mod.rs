#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Months, NaiveDate};
use reagent_forecast::{
    config::AppConfig,
    db,
    entities::{consumption, reagent_prediction, reagent_prediction_summary},
    AppState,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, DatabaseBackend as DbBackend, DatabaseConnection, EntityTrait,
    PaginatorTrait, Set, Statement,
};
use serde_json::Value;
use tower::ServiceExt;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    // One connection keeps every query on the same in-memory database.
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg
}

/// Fresh in-memory SQLite database with migrations applied.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let pool = db::establish_connection_from_app_config(&test_config())
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(pool)
}

pub async fn execute_sql(db: &DatabaseConnection, sql: &str) {
    db.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
        .await
        .expect("raw statement");
}

/// Inserts one consumption record.
pub async fn record_consumption(
    db: &DatabaseConnection,
    reagent_id: i32,
    reagent_name: &str,
    consumed_on: NaiveDate,
    quantity: Option<f64>,
) {
    let row = consumption::ActiveModel {
        reagent_id: Set(reagent_id),
        reagent_name: Set(reagent_name.to_string()),
        consumed_on: Set(consumed_on),
        quantity_consumed: Set(quantity.and_then(Decimal::from_f64)),
        comment: Set(None),
        ..Default::default()
    };
    consumption::Entity::insert(row)
        .exec(db)
        .await
        .expect("insert consumption");
}

/// Seeds `count` monthly records starting at `start`, the i-th valued `value(i)`.
pub async fn seed_monthly(
    db: &DatabaseConnection,
    reagent_id: i32,
    reagent_name: &str,
    start: NaiveDate,
    count: u32,
    value: impl Fn(u32) -> f64,
) {
    for i in 0..count {
        record_consumption(
            db,
            reagent_id,
            reagent_name,
            start + Months::new(i),
            Some(value(i)),
        )
        .await;
    }
}

pub async fn all_predictions(db: &DatabaseConnection) -> Vec<reagent_prediction::Model> {
    reagent_prediction::Entity::find()
        .all(db)
        .await
        .expect("read predictions")
}

pub async fn all_summaries(db: &DatabaseConnection) -> Vec<reagent_prediction_summary::Model> {
    reagent_prediction_summary::Entity::find()
        .all(db)
        .await
        .expect("read summaries")
}

pub async fn prediction_count(db: &DatabaseConnection) -> u64 {
    reagent_prediction::Entity::find()
        .count(db)
        .await
        .expect("count predictions")
}

/// Router plus state over a fresh database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let state = AppState::new(db, test_config());
        let router = reagent_forecast::build_router(state.clone());
        Self { router, state }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub async fn request(&self, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }
}
