//! Tally CLI - Personal finance dashboard
//!
//! Usage:
//!   tally summary                    Totals for the data file
//!   tally report breakdown           Spending by category
//!   tally import --file export.csv   Merge a bank export into the data file
//!   tally serve --port 3000          Start the dashboard API server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tally_core::{Config, Dataset, FilterSpec};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

/// Load the data file and resolve the filter flags against it
fn open_view(data: &Path, config: &Config, filter: &FilterArgs) -> Result<(Dataset, FilterSpec)> {
    let dataset = commands::load_dataset(data)?;
    let spec = commands::build_filter(config, &dataset, filter)?;
    Ok((dataset, spec))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Summary { filter } => {
            let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
            commands::cmd_summary(&dataset, &spec)
        }
        Commands::Transactions { limit, filter } => {
            let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
            commands::cmd_transactions(&dataset, &spec, limit)
        }
        Commands::Categories => {
            let dataset = commands::load_dataset(&cli.data)?;
            commands::cmd_categories(&dataset)
        }
        Commands::Report { report_type } => match report_type {
            ReportType::Breakdown { flow, filter } => {
                let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
                commands::cmd_report_breakdown(&dataset, &spec, flow)
            }
            ReportType::Monthly { fill, filter } => {
                let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
                commands::cmd_report_monthly(&dataset, &spec, fill || config.fill_missing_months)
            }
            ReportType::Averages { filter } => {
                let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
                commands::cmd_report_averages(&dataset, &spec)
            }
            ReportType::Export {
                output,
                flow,
                fill,
                filter,
            } => {
                let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
                let mut options = config.report_options();
                options.flow = flow;
                options.fill_missing |= fill;
                commands::cmd_report_export(&dataset, &spec, &options, output.as_deref())
            }
            ReportType::Trend { target, filter } => {
                let (dataset, spec) = open_view(&cli.data, &config, &filter)?;
                commands::cmd_report_trend(&dataset, &spec, &config.projection, target)
            }
        },
        Commands::Import { file, format } => {
            commands::cmd_import(&cli.data, &file, format).map(|_| ())
        }
        Commands::Generate { output, days, seed } => commands::cmd_generate(&output, days, seed),
        Commands::Serve { port, host } => commands::cmd_serve(&cli.data, config, host, port).await,
    }
}
