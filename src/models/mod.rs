pub mod forecast;

pub use forecast::{
    ConsumptionSeries, ForecastPoint, ForecastReport, MonthlyForecast, ReagentForecast,
    ReagentSummary, RunReport, SkipReason, SkippedReagent,
};
