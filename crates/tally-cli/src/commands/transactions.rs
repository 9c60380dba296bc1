//! Transaction command implementations

use std::io::IsTerminal;

use anyhow::Result;
use tally_core::{apply, Dataset, FilterSpec};

use super::truncate;

/// Right-align an amount in `width` columns, colouring after padding
///
/// Expenses are red and income green; zero stays uncoloured.
pub fn format_amount(amount: f64, width: usize, color: bool) -> String {
    let text = if amount > 0.0 {
        format!("+{:.2}", amount)
    } else if amount < 0.0 {
        format!("{:.2}", amount)
    } else {
        "0.00".to_string()
    };
    let padded = format!("{:>width$}", text, width = width);

    if !color || amount == 0.0 {
        padded
    } else if amount < 0.0 {
        format!("\x1b[31m{}\x1b[0m", padded) // Red for expenses
    } else {
        format!("\x1b[32m{}\x1b[0m", padded) // Green for income
    }
}

pub fn cmd_transactions(dataset: &Dataset, spec: &FilterSpec, limit: usize) -> Result<()> {
    let view = apply(dataset, spec);

    if let Some(term) = &spec.search {
        let unsearched = apply(dataset, &spec.clone().search(None)).len();
        println!();
        println!("🔍 \"{}\" matches {} of {} items", term, view.len(), unsearched);
    }

    if view.is_empty() {
        println!("No transactions match the current filter.");
        return Ok(());
    }

    let color = std::io::stdout().is_terminal();

    println!();
    println!(
        "📝 Transactions (showing {} of {})",
        limit.min(view.len()),
        view.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in view.iter().take(limit) {
        let category = if tx.subcategory.is_empty() {
            tx.category.clone()
        } else {
            format!("{}/{}", tx.category, tx.subcategory)
        };

        println!(
            "   {:>5} │ {} │ {} │ {:20} │ {}",
            tx.id,
            tx.date,
            format_amount(tx.amount, 10, color),
            truncate(&category, 20),
            truncate(&tx.description, 40)
        );
    }

    Ok(())
}
