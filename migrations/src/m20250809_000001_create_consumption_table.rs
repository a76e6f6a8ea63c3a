use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Daily reagent usage as recorded by the laboratory
        manager
            .create_table(
                Table::create()
                    .table(Consumption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consumption::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Consumption::ReagentId).integer().not_null())
                    .col(
                        ColumnDef::new(Consumption::ReagentName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Consumption::ConsumedOn).date().not_null())
                    .col(
                        ColumnDef::new(Consumption::QuantityConsumed)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(Consumption::Comment).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consumption_reagent_date")
                    .table(Consumption::Table)
                    .col(Consumption::ReagentId)
                    .col(Consumption::ConsumedOn)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Consumption::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Consumption {
    Table,
    Id,
    ReagentId,
    ReagentName,
    ConsumedOn,
    QuantityConsumed,
    Comment,
}
