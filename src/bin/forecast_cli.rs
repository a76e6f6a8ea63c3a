use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;

use reagent_forecast::{
    config::{self, AppConfig},
    db::{self, DbPool},
    services::forecasting::{ForecastingService, DEFAULT_HISTORY_PAGE_SIZE},
};

#[derive(Parser)]
#[command(
    name = "forecast-cli",
    about = "Run and inspect reagent consumption forecasts",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Execute one forecast run over every reagent
    Run(RunArgs),
    /// Show the most recent committed run
    Latest,
    /// List reagent summaries, newest run first
    History(HistoryArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Override the minimum number of consumption dates per reagent
    #[arg(long)]
    min_data_points: Option<usize>,
    /// Override the projection horizon in days
    #[arg(long)]
    horizon_days: Option<u32>,
}

#[derive(Args)]
struct HistoryArgs {
    #[arg(long, default_value_t = 1)]
    page: u64,
    #[arg(long, default_value_t = DEFAULT_HISTORY_PAGE_SIZE)]
    limit: u64,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn forecasting(&self, args: Option<&RunArgs>) -> Result<ForecastingService> {
        let mut settings = self.config.forecast;
        if let Some(args) = args {
            if let Some(min) = args.min_data_points {
                settings.min_data_points = min;
            }
            if let Some(days) = args.horizon_days {
                settings.horizon_days = days;
            }
        }
        validator::Validate::validate(&settings).context("invalid forecast settings")?;
        Ok(ForecastingService::new(self.db.clone(), settings))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Run(args) => {
            let report = context
                .forecasting(Some(&args))?
                .execute_forecast()
                .await
                .context("forecast run failed")?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!(
                    "Run {} committed at {}: {} reagents forecast, {} skipped",
                    report.run_id,
                    report.generated_at.to_rfc3339(),
                    report.reagents_forecast,
                    report.reagents_skipped.len()
                );
                for skipped in &report.reagents_skipped {
                    println!(
                        "  - skipped {} ({}): {}",
                        skipped.reagent_id, skipped.reagent_name, skipped.reason
                    );
                }
            }
        }
        Commands::Latest => {
            let report = context.forecasting(None)?.latest_report().await?;
            match report {
                Some(report) if cli.json => print_json(&report)?,
                Some(report) => {
                    println!("Run {} ({})", report.run_id, report.generated_at.to_rfc3339());
                    for reagent in &report.reagents {
                        println!("- {}", reagent.summary.conclusion_text);
                        for month in &reagent.months {
                            println!(
                                "    {} {:>14} {:>10}%",
                                month.month.format("%Y-%m"),
                                month.expected_consumption,
                                month.percent_change
                            );
                        }
                    }
                }
                None => println!("No forecast run has been committed yet"),
            }
        }
        Commands::History(args) => {
            let history = context
                .forecasting(None)?
                .summary_history(args.page, args.limit)
                .await?;
            if cli.json {
                print_json(&history)?;
            } else {
                println!(
                    "Page {}/{} ({} summaries)",
                    history.page, history.total_pages, history.total
                );
                for summary in &history.items {
                    println!(
                        "- run {} • reagent {} {} • trend {}%",
                        summary.run_id,
                        summary.reagent_id,
                        summary.reagent_name,
                        summary.average_trend
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
