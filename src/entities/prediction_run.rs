use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Control row inserted once per run; its generated key is the run id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prediction_runs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub generated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
