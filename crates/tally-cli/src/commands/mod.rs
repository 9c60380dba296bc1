//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `import` - Import and sample generation commands (merge into the data file)
//! - `reports` - Report generation commands and period resolution
//! - `serve` - Web server command
//! - `status` - Summary and category listing
//! - `transactions` - Transaction listing

pub mod import;
pub mod reports;
pub mod serve;
pub mod status;
pub mod transactions;

// Re-export command functions for main.rs
pub use import::*;
pub use reports::*;
pub use serve::*;
pub use status::*;
pub use transactions::*;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tally_core::filter::month_range;
use tally_core::{load_auto, Config, Dataset, FilterSpec, YearMonth};
use tracing::debug;

use crate::cli::FilterArgs;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Read and parse the data file, detecting its format
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let dataset =
        load_auto(&bytes).with_context(|| format!("Failed to load {}", path.display()))?;
    debug!("Loaded {} transactions from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Turn the filter flags into a filter over `dataset`
///
/// Month bounds win over `--from`/`--to`, which win over `--period`.
pub fn build_filter(config: &Config, dataset: &Dataset, args: &FilterArgs) -> Result<FilterSpec> {
    let (mut from, mut to) =
        resolve_period(&args.period, args.from.as_deref(), args.to.as_deref())?;

    if args.month_from.is_some() || args.month_to.is_some() {
        let start = args
            .month_from
            .unwrap_or_else(|| YearMonth::from_date(dataset.first_date()));
        let end = args
            .month_to
            .unwrap_or_else(|| YearMonth::from_date(dataset.last_date()));
        if start > end {
            bail!("--month-from {} is after --month-to {}", start, end);
        }
        let (first, last) = month_range(start, end, dataset);
        from = Some(first);
        to = Some(last);
    }

    let mut spec = config
        .filter()
        .date_from(from)
        .date_to(to)
        .categories(args.categories.iter().cloned())
        .search(args.search.as_deref())
        .show_hidden(args.show_hidden);
    for id in &args.hidden {
        spec = spec.hide(*id);
    }

    Ok(spec)
}
