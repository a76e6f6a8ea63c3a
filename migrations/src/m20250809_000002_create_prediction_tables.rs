use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Control table: one row per run, its key is the run id
        manager
            .create_table(
                Table::create()
                    .table(PredictionRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PredictionRuns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PredictionRuns::GeneratedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReagentPredictions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReagentPredictions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReagentPredictions::RunId).integer().not_null())
                    .col(
                        ColumnDef::new(ReagentPredictions::ReagentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictions::ReagentName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReagentPredictions::Month).date().not_null())
                    .col(
                        ColumnDef::new(ReagentPredictions::ExpectedConsumption)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictions::PercentChange)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictions::GeneratedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reagent_predictions_run_reagent_month")
                    .table(ReagentPredictions::Table)
                    .col(ReagentPredictions::RunId)
                    .col(ReagentPredictions::ReagentId)
                    .col(ReagentPredictions::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReagentPredictionSummaries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::RunId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::ReagentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::ReagentName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::AverageTrend)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::PeakMonth)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::TroughMonth)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::ConclusionText)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReagentPredictionSummaries::GeneratedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reagent_prediction_summaries_run_reagent")
                    .table(ReagentPredictionSummaries::Table)
                    .col(ReagentPredictionSummaries::RunId)
                    .col(ReagentPredictionSummaries::ReagentId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ReagentPredictionSummaries::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ReagentPredictions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PredictionRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PredictionRuns {
    Table,
    Id,
    GeneratedAt,
}

#[derive(DeriveIden)]
enum ReagentPredictions {
    Table,
    Id,
    RunId,
    ReagentId,
    ReagentName,
    Month,
    ExpectedConsumption,
    PercentChange,
    GeneratedAt,
}

#[derive(DeriveIden)]
enum ReagentPredictionSummaries {
    Table,
    Id,
    RunId,
    ReagentId,
    ReagentName,
    AverageTrend,
    PeakMonth,
    TroughMonth,
    ConclusionText,
    GeneratedAt,
}
