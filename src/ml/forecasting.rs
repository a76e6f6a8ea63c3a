//! Trend models fitted on a reagent's consumption history.
//!
//! [`LinearTrendModel`] fits `quantity = intercept + slope * t` by ordinary
//! least squares, where `t` is the number of days since the first
//! observation. Gaps between observations are kept as real calendar
//! distance, so zero-quantity days must stay in the series.

use chrono::{Days, NaiveDate};

use crate::errors::ServiceError;
use crate::models::{ConsumptionSeries, ForecastPoint};

/// Fit / project capability used by the forecast pipeline.
pub trait ForecastModel: Send + Sync {
    type Fitted: Send;

    /// Fits the model on a date-ordered series.
    fn fit(&self, series: &ConsumptionSeries) -> Result<Self::Fitted, ServiceError>;

    /// Returns in-sample values for every history date followed by one
    /// point per day for `horizon_days` days after the last history date.
    fn project(
        &self,
        fitted: &Self::Fitted,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>, ServiceError>;
}

/// Ordinary least squares trend over calendar days.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearTrendModel;

impl LinearTrendModel {
    pub fn new() -> Self {
        Self
    }
}

/// A fitted linear trend.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearTrend {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    r_squared: f64,
    history: Vec<NaiveDate>,
}

impl LinearTrend {
    /// Trend per day
    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficient of determination on the training data
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Projected value on `date`.
    pub fn predict_at(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        self.intercept + self.slope * t
    }
}

impl ForecastModel for LinearTrendModel {
    type Fitted = LinearTrend;

    fn fit(&self, series: &ConsumptionSeries) -> Result<LinearTrend, ServiceError> {
        let origin = series.first_date().ok_or_else(|| {
            ServiceError::ModelError(format!(
                "cannot fit reagent {} on an empty series",
                series.reagent_id
            ))
        })?;
        if series.len() < 2 {
            return Err(ServiceError::ModelError(format!(
                "linear trend needs at least 2 points, reagent {} has {}",
                series.reagent_id,
                series.len()
            )));
        }

        let xs: Vec<f64> = series
            .points
            .iter()
            .map(|(date, _)| (*date - origin).num_days() as f64)
            .collect();
        // Non-finite quantities count as zero consumption.
        let ys: Vec<f64> = series
            .points
            .iter()
            .map(|(_, y)| if y.is_finite() { *y } else { 0.0 })
            .collect();

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        // Centered sums keep precision for long histories.
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();

        if sxx.abs() < 1e-10 {
            return Err(ServiceError::ModelError(
                "singular design: all observations share one date".to_string(),
            ));
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
        let ss_res: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();
        let r_squared = if ss_tot > 1e-10 {
            1.0 - ss_res / ss_tot
        } else {
            1.0
        };

        Ok(LinearTrend {
            origin,
            intercept,
            slope,
            r_squared,
            history: series.points.iter().map(|(date, _)| *date).collect(),
        })
    }

    fn project(
        &self,
        fitted: &LinearTrend,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>, ServiceError> {
        let last = fitted.history.last().copied().ok_or_else(|| {
            ServiceError::ModelError("cannot project an unfitted trend".to_string())
        })?;

        let mut points = Vec::with_capacity(fitted.history.len() + horizon_days as usize);
        points.extend(fitted.history.iter().map(|date| ForecastPoint {
            date: *date,
            value: fitted.predict_at(*date),
        }));

        for offset in 1..=u64::from(horizon_days) {
            let date = last.checked_add_days(Days::new(offset)).ok_or_else(|| {
                ServiceError::ModelError(format!("horizon overflows the calendar after {}", last))
            })?;
            points.push(ForecastPoint {
                date,
                value: fitted.predict_at(date),
            });
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(values: &[f64]) -> ConsumptionSeries {
        let start = date(2024, 1, 1);
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Days::new(i as u64), *v))
            .collect();
        ConsumptionSeries::new(1, "Ethanol", points)
    }

    #[test]
    fn recovers_exact_line() {
        let model = LinearTrendModel::new();
        let fitted = model.fit(&daily(&[10.0, 12.0, 14.0, 16.0, 18.0, 20.0])).unwrap();

        assert!((fitted.slope() - 2.0).abs() < 1e-9);
        assert!((fitted.intercept() - 10.0).abs() < 1e-9);
        assert!((fitted.r_squared() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn uses_calendar_distance_between_observations() {
        // Same values at irregular dates: the slope is per day, not per index.
        let series = ConsumptionSeries::new(
            1,
            "Ethanol",
            vec![(date(2024, 1, 1), 0.0), (date(2024, 1, 11), 10.0)],
        );
        let fitted = LinearTrendModel.fit(&series).unwrap();
        assert!((fitted.slope() - 1.0).abs() < 1e-9);
        assert!((fitted.predict_at(date(2024, 1, 21)) - 20.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(30)]
    #[case(365)]
    fn projection_covers_history_then_horizon(#[case] horizon: u32) {
        let model = LinearTrendModel;
        let series = daily(&[1.0, 2.0, 3.0, 4.0]);
        let fitted = model.fit(&series).unwrap();
        let points = model.project(&fitted, horizon).unwrap();

        assert_eq!(points.len(), series.len() + horizon as usize);
        assert_eq!(points[0].date, date(2024, 1, 1));
        let last = points.last().unwrap();
        assert_eq!(
            last.date,
            date(2024, 1, 4) + Days::new(u64::from(horizon))
        );
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn flat_series_projects_flat() {
        let model = LinearTrendModel;
        let fitted = model.fit(&daily(&[5.0; 12])).unwrap();
        let points = model.project(&fitted, 10).unwrap();
        assert!(points.iter().all(|p| (p.value - 5.0).abs() < 1e-9));
    }

    #[test]
    fn rejects_degenerate_input() {
        let model = LinearTrendModel;
        assert_matches!(
            model.fit(&ConsumptionSeries::new(4, "Empty", vec![])),
            Err(ServiceError::ModelError(_))
        );
        assert_matches!(model.fit(&daily(&[3.0])), Err(ServiceError::ModelError(_)));
    }

    #[test]
    fn non_finite_quantities_fit_as_zero() {
        let model = LinearTrendModel;
        let coerced = model
            .fit(&daily(&[4.0, f64::NAN, 8.0, f64::INFINITY]))
            .unwrap();
        let zeros = model.fit(&daily(&[4.0, 0.0, 8.0, 0.0])).unwrap();

        assert!(coerced.slope().is_finite());
        assert!((coerced.slope() - zeros.slope()).abs() < 1e-12);
        assert!((coerced.intercept() - zeros.intercept()).abs() < 1e-12);
    }
}
