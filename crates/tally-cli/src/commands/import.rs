//! Import and sample generation command implementations

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tally_core::{
    detect_format, load_with_format, merge, write_csv, Dataset, FileFormat, MergeStats,
    SampleGenerator,
};

use super::load_dataset;

fn save_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    write_csv(dataset, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Parse `file` and merge it into the data file, creating it if needed
pub fn cmd_import(data_path: &Path, file: &Path, format: Option<FileFormat>) -> Result<MergeStats> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let format = format.unwrap_or_else(|| detect_format(&bytes));

    println!("📥 Importing {} from {}...", format, file.display());

    let incoming = load_with_format(bytes.as_slice(), format)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    println!("   Found {} transactions", incoming.len());

    let (dataset, stats) = if data_path.exists() {
        let existing = load_dataset(data_path)?;
        merge(&existing, incoming)?
    } else {
        let added = incoming.len();
        (incoming, MergeStats { added, skipped: 0 })
    };

    save_dataset(&dataset, data_path)?;

    println!();
    println!("✅ Import complete!");
    println!("   Added: {}", stats.added);
    if stats.skipped > 0 {
        println!("   Skipped (duplicates): {}", stats.skipped);
    }
    println!("   Total: {} in {}", dataset.len(), data_path.display());

    Ok(stats)
}

/// Write `days` of random history ending today
pub fn cmd_generate(output: &Path, days: u32, seed: Option<u64>) -> Result<()> {
    let end = Utc::now().date_naive();
    let start = end
        .checked_sub_signed(Duration::days(i64::from(days)))
        .context("--days is too large")?;

    let mut generator = SampleGenerator::new(start, end);
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }
    let dataset = generator.generate()?;

    save_dataset(&dataset, output)?;

    println!("✅ Generated {} transactions", dataset.len());
    println!("   Period: {} to {}", start, end);
    println!("   Written to {}", output.display());

    Ok(())
}
