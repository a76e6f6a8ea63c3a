pub mod consumption;
pub mod prediction_run;
pub mod reagent_prediction;
pub mod reagent_prediction_summary;
