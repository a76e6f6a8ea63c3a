pub use sea_orm_migration::prelude::*;

mod m20250809_000001_create_consumption_table;
mod m20250809_000002_create_prediction_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250809_000001_create_consumption_table::Migration),
            Box::new(m20250809_000002_create_prediction_tables::Migration),
        ]
    }
}
