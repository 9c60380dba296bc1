//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance dashboard:
//! - Loading transaction CSV files (native and CaixaBank layouts)
//! - Merging imported files with duplicate detection
//! - Filtering by date range, category and hidden entries
//! - Aggregates: income/expense totals, category breakdowns, monthly averages
//! - Balance trend projection and target-balance outlook
//! - Sample data generation and configuration

pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod generate;
pub mod loader;
pub mod models;
pub mod reports;
pub mod trend;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::{apply, FilterSpec, FilteredView};
pub use generate::SampleGenerator;
pub use loader::{detect_format, load, load_auto, load_with_format, merge, write_csv};
pub use models::{
    AggregateReport, CategoryBreakdown, CategoryNode, Dataset, FileFormat, Flow, MergeStats,
    Totals, Transaction, TrendPoint, TrendReport, YearMonth,
};
pub use reports::{build_report, ReportOptions};
pub use trend::ProjectionConfig;
