use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One usage record for a reagent on a given day. Read-only to the forecast pipeline.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumption")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reagent_id: i32,
    pub reagent_name: String,
    pub consumed_on: Date,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub quantity_consumed: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
