use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reagent_prediction_summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    pub run_id: i32,
    pub reagent_id: i32,
    pub reagent_name: String,
    /// Mean month-over-month percent change across the horizon
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub average_trend: Decimal,
    pub peak_month: Option<Date>,
    pub trough_month: Option<Date>,
    #[sea_orm(column_type = "Text")]
    pub conclusion_text: String,
    pub generated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
