//! Summary and category listing commands

use anyhow::Result;
use tally_core::format::{format_date_range, format_money};
use tally_core::reports::totals;
use tally_core::trend::{balance_series, outlook};
use tally_core::{apply, Dataset, FilterSpec};

pub fn cmd_summary(dataset: &Dataset, spec: &FilterSpec) -> Result<()> {
    let (first, last) = dataset.date_range();

    println!();
    println!("📊 Tally Summary");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Data: {} transactions, {}",
        dataset.len(),
        format_date_range(first, last)
    );

    let view = apply(dataset, spec);
    let Some((from, to)) = view.date_range() else {
        println!("   No transactions match the current filter.");
        return Ok(());
    };
    println!(
        "   Showing: {} transactions, {}",
        view.len(),
        format_date_range(from, to)
    );

    let totals = totals(&view);
    println!();
    println!("   Income:    {:>14}", format_money(totals.income));
    println!("   Expenses:  {:>14}", format_money(totals.expense));
    println!("   Net:       {:>14}", format_money(totals.net));

    if let Some(stats) = outlook(&balance_series(&view)) {
        println!("   Balance:   {:>14}", format_money(stats.current_balance));
    }

    println!();
    Ok(())
}

pub fn cmd_categories(dataset: &Dataset) -> Result<()> {
    let subcategories = dataset.subcategories();

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");

    for category in dataset.categories() {
        let count = dataset
            .transactions()
            .iter()
            .filter(|tx| tx.category == category)
            .count();
        let label = if category.is_empty() {
            "(uncategorized)"
        } else {
            category.as_str()
        };
        println!("   {} ({})", label, count);

        if let Some(children) = subcategories.get(&category) {
            for child in children {
                println!("     └─ {}", child);
            }
        }
    }

    Ok(())
}
