use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::config::ForecastSettings;
use crate::entities::reagent_prediction_summary;
use crate::errors::ServiceError;
use crate::ml::{ForecastModel, LinearTrendModel};
use crate::models::{ForecastReport, RunReport, SkipReason, SkippedReagent};
use crate::repositories::{ConsumptionRepository, PredictionRepository};
use crate::services::forecast_engine::{forecast_reagent, ReagentOutcome};
use crate::services::run_sequence::RunIdAllocator;
use crate::PaginatedResponse;

/// Default page size of the summary history
pub const DEFAULT_HISTORY_PAGE_SIZE: u64 = 20;

/// Runs the reagent forecast pipeline and serves its results.
pub struct ForecastingService<M: ForecastModel = LinearTrendModel> {
    db: Arc<DatabaseConnection>,
    model: M,
    settings: ForecastSettings,
    allocator: RunIdAllocator,
    predictions: PredictionRepository,
}

impl ForecastingService<LinearTrendModel> {
    pub fn new(db: Arc<DatabaseConnection>, settings: ForecastSettings) -> Self {
        Self::with_model(db, LinearTrendModel::new(), settings)
    }
}

impl<M: ForecastModel> ForecastingService<M> {
    pub fn with_model(db: Arc<DatabaseConnection>, model: M, settings: ForecastSettings) -> Self {
        Self {
            allocator: RunIdAllocator::new(db.clone()),
            predictions: PredictionRepository::new(db.clone()),
            db,
            model,
            settings,
        }
    }

    /// Runs the pipeline now.
    pub async fn execute_forecast(&self) -> Result<RunReport, ServiceError> {
        self.execute_forecast_at(Utc::now()).await
    }

    /// Runs the pipeline as of `generated_at`; its UTC date is "today".
    ///
    /// Every row of the run is written in one transaction that commits only
    /// if all reagents were processed; any failure rolls the whole run back.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn execute_forecast_at(
        &self,
        generated_at: DateTime<Utc>,
    ) -> Result<RunReport, ServiceError> {
        let started = Instant::now();
        let generated_at = generated_at.trunc_subsecs(6);

        let run_id = self.allocator.allocate(generated_at).await?;
        tracing::Span::current().record("run_id", run_id);

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin forecast transaction: {}", e);
            ServiceError::ConnectionError(e.to_string())
        })?;

        match self.process_reagents(&txn, run_id, generated_at).await {
            Ok((reagents_forecast, reagents_skipped)) => {
                txn.commit().await.map_err(|e| {
                    error!(run_id, "Failed to commit forecast run: {}", e);
                    counter!("reagent_forecast.run.rolled_back", 1);
                    ServiceError::DatabaseError(e)
                })?;

                counter!("reagent_forecast.run.committed", 1);
                histogram!(
                    "reagent_forecast.run.duration_seconds",
                    started.elapsed().as_secs_f64()
                );
                info!(
                    run_id,
                    reagents_forecast,
                    reagents_skipped = reagents_skipped.len(),
                    "Forecast run committed"
                );

                Ok(RunReport {
                    run_id,
                    generated_at,
                    reagents_forecast,
                    reagents_skipped,
                })
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    error!(run_id, "Rollback of forecast run failed: {}", rollback);
                }
                error!(run_id, error = %e, "Forecast run rolled back");
                counter!("reagent_forecast.run.rolled_back", 1);
                Err(e)
            }
        }
    }

    async fn process_reagents(
        &self,
        txn: &DatabaseTransaction,
        run_id: i32,
        generated_at: DateTime<Utc>,
    ) -> Result<(usize, Vec<SkippedReagent>), ServiceError> {
        let today = generated_at.date_naive();
        let reagents = ConsumptionRepository::distinct_reagents(txn).await?;
        info!(run_id, reagents = reagents.len(), "Processing reagents");

        let mut forecast = 0;
        let mut skipped = Vec::new();
        for (reagent_id, reagent_name) in reagents {
            let outcome = self
                .process_reagent(txn, run_id, reagent_id, &reagent_name, generated_at, today)
                .await
                .map_err(|e| ServiceError::processing(reagent_id, e))?;

            match outcome {
                Some(reason) => skipped.push(SkippedReagent {
                    reagent_id,
                    reagent_name,
                    reason,
                }),
                None => forecast += 1,
            }
        }

        Ok((forecast, skipped))
    }

    /// Returns the skip reason, or `None` when rows were written.
    async fn process_reagent(
        &self,
        txn: &DatabaseTransaction,
        run_id: i32,
        reagent_id: i32,
        reagent_name: &str,
        generated_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Option<SkipReason>, ServiceError> {
        let series = ConsumptionRepository::series(txn, reagent_id, reagent_name).await?;

        match forecast_reagent(&self.model, &series, &self.settings, today)? {
            ReagentOutcome::Skip(reason) => Ok(Some(reason)),
            ReagentOutcome::Forecast { months, summary } => {
                PredictionRepository::insert_monthly(
                    txn,
                    run_id,
                    reagent_id,
                    reagent_name,
                    &months,
                    generated_at,
                )
                .await?;
                PredictionRepository::insert_summary(
                    txn,
                    run_id,
                    reagent_id,
                    reagent_name,
                    &summary,
                    generated_at,
                )
                .await?;
                Ok(None)
            }
        }
    }

    /// Greatest run id with committed rows
    pub async fn latest_run_id(&self) -> Result<Option<i32>, ServiceError> {
        self.predictions.latest_run_id().await
    }

    /// Rows of the most recent run, `None` before the first committed run
    #[instrument(skip(self))]
    pub async fn latest_report(&self) -> Result<Option<ForecastReport>, ServiceError> {
        match self.predictions.latest_run_id().await? {
            Some(run_id) => self.predictions.find_run(run_id).await,
            None => Ok(None),
        }
    }

    /// Rows of one run
    #[instrument(skip(self))]
    pub async fn run_report(&self, run_id: i32) -> Result<ForecastReport, ServiceError> {
        self.predictions
            .find_run(run_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Forecast run {} not found", run_id)))
    }

    /// Summaries of all runs, newest first
    #[instrument(skip(self))]
    pub async fn summary_history(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<reagent_prediction_summary::Model>, ServiceError> {
        if page == 0 || page_size == 0 {
            return Err(ServiceError::ValidationError(
                "page and page size must be at least 1".to_string(),
            ));
        }

        let (items, total) = self.predictions.find_summaries(page, page_size).await?;
        Ok(PaginatedResponse {
            items,
            total,
            page,
            limit: page_size,
            total_pages: total.div_ceil(page_size),
        })
    }
}
