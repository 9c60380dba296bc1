//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_core::{FileFormat, Flow, YearMonth};

/// Tally - Explore where your money goes
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Personal finance dashboard over a transaction CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Transaction CSV file
    #[arg(long, default_value = "transactions.csv", global = true)]
    pub data: PathBuf,

    /// Config file (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options that narrow the loaded transactions
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Time period: this-month, last-month, this-year, last-30-days, last-90-days, last-12-months, all
    #[arg(long, default_value = "all")]
    pub period: String,

    /// Custom start date (YYYY-MM-DD) - overrides period
    #[arg(long)]
    pub from: Option<String>,

    /// Custom end date (YYYY-MM-DD) - overrides period
    #[arg(long)]
    pub to: Option<String>,

    /// First month to include (YYYY-MM) - overrides dates
    #[arg(long)]
    pub month_from: Option<YearMonth>,

    /// Last month to include (YYYY-MM), capped at the last transaction
    #[arg(long)]
    pub month_to: Option<YearMonth>,

    /// Only include this category (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Only rows whose description, category or subcategory contain this text
    #[arg(long)]
    pub search: Option<String>,

    /// Hide a transaction by id (repeatable)
    #[arg(long = "hide")]
    pub hidden: Vec<usize>,

    /// Include hidden transactions
    #[arg(long)]
    pub show_hidden: bool,
}

impl Default for FilterArgs {
    fn default() -> Self {
        Self {
            period: "all".to_string(),
            from: None,
            to: None,
            month_from: None,
            month_to: None,
            categories: Vec::new(),
            search: None,
            hidden: Vec::new(),
            show_hidden: false,
        }
    }
}

/// A plain number; rejects NaN and infinities
fn parse_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("invalid number: {}", s))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("must be a finite number: {}", s))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dataset bounds and income/expense totals
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List transactions
    Transactions {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List categories and their subcategories
    Categories,

    /// Generate reports
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Import a bank export, merging it into the data file
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// File format: native, caixabank (auto-detected if not specified)
        #[arg(long)]
        format: Option<FileFormat>,
    },

    /// Write a randomly generated transaction history
    Generate {
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of days of history, ending today
        #[arg(long, default_value = "365")]
        days: u32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Start the dashboard API server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Amounts by category and subcategory
    Breakdown {
        /// Flow: all, income, expense
        #[arg(long, default_value = "all")]
        flow: Flow,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Income and expense per month
    Monthly {
        /// Include months without transactions
        #[arg(long)]
        fill: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Average monthly spending per category
    Averages {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Write every aggregate for the view as JSON
    Export {
        /// Output JSON file (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Breakdown flow: all, income, expense
        #[arg(long, default_value = "all")]
        flow: Flow,

        /// Include months without transactions
        #[arg(long)]
        fill: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Balance trend, projection and target outlook
    Trend {
        /// Target balance to project towards
        #[arg(long, allow_negative_numbers = true, value_parser = parse_finite)]
        target: Option<f64>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}
