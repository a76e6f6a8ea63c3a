//! Per-reagent fit, projection and monthly aggregation.

use chrono::NaiveDate;
use metrics::counter;
use tracing::{debug, warn};

use crate::config::ForecastSettings;
use crate::errors::ServiceError;
use crate::ml::ForecastModel;
use crate::models::{ConsumptionSeries, MonthlyForecast, ReagentSummary, SkipReason};
use crate::services::{aggregation, summary};

/// What the pipeline does with one reagent.
#[derive(Clone, Debug, PartialEq)]
pub enum ReagentOutcome {
    Forecast {
        months: Vec<MonthlyForecast>,
        summary: ReagentSummary,
    },
    Skip(SkipReason),
}

/// Runs fit → project → filter → aggregate → summarize for one reagent.
///
/// Sparse history and an empty aggregate are reported as
/// [`ReagentOutcome::Skip`]; model failures are errors.
pub fn forecast_reagent<M: ForecastModel>(
    model: &M,
    series: &ConsumptionSeries,
    settings: &ForecastSettings,
    today: NaiveDate,
) -> Result<ReagentOutcome, ServiceError> {
    if series.len() < settings.min_data_points {
        return Ok(skip(
            series,
            SkipReason::InsufficientData {
                available: series.len(),
                required: settings.min_data_points,
            },
        ));
    }

    let fitted = model.fit(series)?;
    let mut points = model.project(&fitted, settings.horizon_days)?;
    points.retain(|p| p.date >= today);

    let months = aggregation::aggregate_monthly(&points);
    if months.is_empty() {
        return Ok(skip(series, SkipReason::EmptyAggregate));
    }

    debug!(
        reagent_id = series.reagent_id,
        months = months.len(),
        "Reagent forecast aggregated"
    );
    let summary = summary::summarize(&series.reagent_name, &months);
    Ok(ReagentOutcome::Forecast { months, summary })
}

fn skip(series: &ConsumptionSeries, reason: SkipReason) -> ReagentOutcome {
    warn!(
        reagent_id = series.reagent_id,
        reagent_name = %series.reagent_name,
        %reason,
        "Skipping reagent"
    );
    counter!("reagent_forecast.reagent.skipped", 1);
    ReagentOutcome::Skip(reason)
}
