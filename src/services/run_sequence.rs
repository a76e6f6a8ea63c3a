//! Allocation of prediction run ids.

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entities::prediction_run;
use crate::errors::ServiceError;
use crate::repositories::PredictionRepository;

/// Hands out strictly increasing run ids.
///
/// The primary path inserts a `prediction_runs` control row and uses its
/// generated key. The row is written on its own connection, outside any run
/// transaction, so an id is never reissued even if the run rolls back.
/// When the control row cannot be inserted, ids fall back to
/// `max(run_id) + 1` over `reagent_predictions`, raised to the control
/// table's own maximum while that table is still readable. The fallback is
/// not safe against concurrent runs.
#[derive(Debug, Clone)]
pub struct RunIdAllocator {
    db: Arc<DatabaseConnection>,
}

impl RunIdAllocator {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn allocate(&self, generated_at: DateTime<Utc>) -> Result<i32, ServiceError> {
        match self.allocate_control_row(generated_at).await {
            Ok(run_id) => {
                info!(run_id, "Allocated prediction run id");
                Ok(run_id)
            }
            Err(primary) => {
                warn!(
                    error = %primary,
                    "Run id control table unavailable, falling back to max(run_id)+1"
                );
                counter!("reagent_forecast.run_id.fallback", 1);
                self.allocate_from_predictions().await.map_err(|fallback| {
                    ServiceError::AllocationError(format!(
                        "control row insert failed ({}); fallback failed ({})",
                        primary, fallback
                    ))
                })
            }
        }
    }

    async fn allocate_control_row(&self, generated_at: DateTime<Utc>) -> Result<i32, ServiceError> {
        let row = prediction_run::ActiveModel {
            generated_at: Set(generated_at),
            ..Default::default()
        };
        let result = prediction_run::Entity::insert(row)
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(result.last_insert_id)
    }

    async fn allocate_from_predictions(&self) -> Result<i32, ServiceError> {
        let predicted = PredictionRepository::max_prediction_run_id(self.db.as_ref()).await?;
        let controlled = PredictionRepository::max_control_run_id(self.db.as_ref())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Run control table is unreadable");
                None
            });
        let run_id = predicted
            .max(controlled)
            .unwrap_or(0)
            .checked_add(1).ok_or_else(|| {
            ServiceError::AllocationError("run id space exhausted".to_string())
        })?;
        warn!(run_id, "Allocated prediction run id from existing predictions");
        Ok(run_id)
    }
}
