use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::entities::{reagent_prediction, reagent_prediction_summary};

/// Date-ordered consumption history of one reagent, one point per distinct date.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumptionSeries {
    pub reagent_id: i32,
    pub reagent_name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl ConsumptionSeries {
    pub fn new(reagent_id: i32, reagent_name: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            reagent_id,
            reagent_name: reagent_name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(date, _)| *date)
    }
}

/// A single projected day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Mean projection for one calendar month, keyed by its first day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecast {
    pub month: NaiveDate,
    pub expected_consumption: Decimal,
    pub percent_change: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReagentSummary {
    pub average_trend: Decimal,
    pub peak_month: Option<NaiveDate>,
    pub trough_month: Option<NaiveDate>,
    pub conclusion_text: String,
}

/// Why a reagent produced no rows in a run. Not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientData { available: usize, required: usize },
    EmptyAggregate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientData {
                available,
                required,
            } => write!(
                f,
                "insufficient data: {} points, {} required",
                available, required
            ),
            SkipReason::EmptyAggregate => write!(f, "no projected months on or after today"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedReagent {
    pub reagent_id: i32,
    pub reagent_name: String,
    pub reason: SkipReason,
}

/// Outcome of a committed forecast run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: i32,
    pub generated_at: DateTime<Utc>,
    pub reagents_forecast: usize,
    pub reagents_skipped: Vec<SkippedReagent>,
}

/// Persisted summary of one reagent together with its monthly rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReagentForecast {
    pub summary: reagent_prediction_summary::Model,
    pub months: Vec<reagent_prediction::Model>,
}

/// Everything a committed run wrote.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub run_id: i32,
    pub generated_at: DateTime<Utc>,
    pub reagents: Vec<ReagentForecast>,
}
