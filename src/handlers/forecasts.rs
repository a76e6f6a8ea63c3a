use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    entities::reagent_prediction_summary,
    errors::ServiceError,
    models::{ForecastReport, RunReport},
    services::forecasting::DEFAULT_HISTORY_PAGE_SIZE,
    ApiResponse, AppState, PaginatedResponse,
};

/// Build the forecast Router scoped under `/api/v1/forecasts`.
pub fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/run", get(run_forecast).post(run_forecast))
        .route("/latest", get(latest_forecast))
        .route("/runs", get(forecast_run))
        .route("/history", get(forecast_history))
}

/// Body returned when a run commits
#[derive(Debug, Serialize)]
pub struct RunTriggered {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: RunReport,
}

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    pub run_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

/// Triggers one forecast run over every reagent.
pub async fn run_forecast(
    State(state): State<AppState>,
) -> Result<Json<RunTriggered>, ServiceError> {
    let report = state.forecasting.execute_forecast().await?;
    Ok(Json(RunTriggered {
        status: "success",
        report,
    }))
}

/// Most recent committed run; `data` is null before the first one.
pub async fn latest_forecast(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Option<ForecastReport>>>, ServiceError> {
    let report = state.forecasting.latest_report().await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn forecast_run(
    State(state): State<AppState>,
    Query(params): Query<RunQuery>,
) -> Result<Json<ApiResponse<ForecastReport>>, ServiceError> {
    let report = state.forecasting.run_report(params.run_id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Summaries of every run, newest first.
pub async fn forecast_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<
    Json<ApiResponse<PaginatedResponse<reagent_prediction_summary::Model>>>,
    ServiceError,
> {
    params.validate()?;
    let history = state
        .forecasting
        .summary_history(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(DEFAULT_HISTORY_PAGE_SIZE),
        )
        .await?;
    Ok(Json(ApiResponse::success(history)))
}
