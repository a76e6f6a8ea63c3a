use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;

use crate::entities::{prediction_run, reagent_prediction, reagent_prediction_summary};
use crate::errors::ServiceError;
use crate::models::{ForecastReport, MonthlyForecast, ReagentForecast, ReagentSummary};
use crate::repositories::Repository;

use super::BaseRepository;

/// Storage of monthly predictions and their summaries
#[derive(Debug, Clone)]
pub struct PredictionRepository {
    base: BaseRepository,
}

impl PredictionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Writes the monthly rows of one reagent for a run.
    pub async fn insert_monthly<C: ConnectionTrait>(
        conn: &C,
        run_id: i32,
        reagent_id: i32,
        reagent_name: &str,
        months: &[MonthlyForecast],
        generated_at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if months.is_empty() {
            return Ok(());
        }

        let rows = months.iter().map(|m| reagent_prediction::ActiveModel {
            run_id: Set(run_id),
            reagent_id: Set(reagent_id),
            reagent_name: Set(reagent_name.to_string()),
            month: Set(m.month),
            expected_consumption: Set(m.expected_consumption),
            percent_change: Set(m.percent_change),
            generated_at: Set(generated_at),
            ..Default::default()
        });

        reagent_prediction::Entity::insert_many(rows)
            .exec(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(())
    }

    /// Writes the summary row of one reagent for a run.
    pub async fn insert_summary<C: ConnectionTrait>(
        conn: &C,
        run_id: i32,
        reagent_id: i32,
        reagent_name: &str,
        summary: &ReagentSummary,
        generated_at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let row = reagent_prediction_summary::ActiveModel {
            run_id: Set(run_id),
            reagent_id: Set(reagent_id),
            reagent_name: Set(reagent_name.to_string()),
            average_trend: Set(summary.average_trend),
            peak_month: Set(summary.peak_month),
            trough_month: Set(summary.trough_month),
            conclusion_text: Set(summary.conclusion_text.clone()),
            generated_at: Set(generated_at),
            ..Default::default()
        };

        reagent_prediction_summary::Entity::insert(row)
            .exec(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(())
    }

    /// Greatest run id referenced by any monthly prediction
    pub async fn max_prediction_run_id<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Option<i32>, ServiceError> {
        let max = reagent_prediction::Entity::find()
            .select_only()
            .column_as(reagent_prediction::Column::RunId.max(), "max_run_id")
            .into_tuple::<Option<i32>>()
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(max.flatten())
    }

    /// Greatest id handed out by the run control table
    pub async fn max_control_run_id<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Option<i32>, ServiceError> {
        let max = prediction_run::Entity::find()
            .select_only()
            .column_as(prediction_run::Column::Id.max(), "max_run_id")
            .into_tuple::<Option<i32>>()
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(max.flatten())
    }

    /// Greatest run id that produced at least one summary
    pub async fn latest_run_id(&self) -> Result<Option<i32>, ServiceError> {
        let max = reagent_prediction_summary::Entity::find()
            .select_only()
            .column_as(reagent_prediction_summary::Column::RunId.max(), "max_run_id")
            .into_tuple::<Option<i32>>()
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(max.flatten())
    }

    /// Summaries and monthly rows of one run, `None` when the run wrote nothing
    pub async fn find_run(&self, run_id: i32) -> Result<Option<ForecastReport>, ServiceError> {
        let db = self.base.get_db();

        let summaries = reagent_prediction_summary::Entity::find()
            .filter(reagent_prediction_summary::Column::RunId.eq(run_id))
            .order_by_asc(reagent_prediction_summary::Column::ReagentId)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let Some(generated_at) = summaries.first().map(|s| s.generated_at) else {
            return Ok(None);
        };

        let mut months = reagent_prediction::Entity::find()
            .filter(reagent_prediction::Column::RunId.eq(run_id))
            .order_by_asc(reagent_prediction::Column::ReagentId)
            .order_by_asc(reagent_prediction::Column::Month)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .peekable();

        let mut reagents = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let mut rows = Vec::new();
            while let Some(row) = months.next_if(|m| m.reagent_id <= summary.reagent_id) {
                if row.reagent_id == summary.reagent_id {
                    rows.push(row);
                }
            }
            reagents.push(ReagentForecast {
                summary,
                months: rows,
            });
        }

        Ok(Some(ForecastReport {
            run_id,
            generated_at,
            reagents,
        }))
    }

    /// Summaries across runs, newest run first
    pub async fn find_summaries(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<reagent_prediction_summary::Model>, u64), ServiceError> {
        let paginator = reagent_prediction_summary::Entity::find()
            .order_by_desc(reagent_prediction_summary::Column::RunId)
            .order_by_asc(reagent_prediction_summary::Column::ReagentId)
            .paginate(self.base.get_db(), page_size);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;

        let summaries = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((summaries, total))
    }
}

impl Repository for PredictionRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
