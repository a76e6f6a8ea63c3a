use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expected consumption of one reagent for one month of one run.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reagent_predictions")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    pub run_id: i32,
    pub reagent_id: i32,
    pub reagent_name: String,
    /// First day of the forecast month
    pub month: Date,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub expected_consumption: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub percent_change: Decimal,
    pub generated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
