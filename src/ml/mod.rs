/*!
 * # Forecast models
 *
 * The pipeline only talks to [`ForecastModel`]; the concrete fitting
 * algorithm can be swapped without touching persistence or aggregation.
 */

pub mod forecasting;

pub use forecasting::{ForecastModel, LinearTrend, LinearTrendModel};
