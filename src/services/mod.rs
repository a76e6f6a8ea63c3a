pub mod aggregation;
pub mod forecast_engine;
pub mod forecasting;
pub mod run_sequence;
pub mod summary;
