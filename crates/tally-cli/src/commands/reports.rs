//! Report command implementations

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use tally_core::format::{format_date_range, format_money};
use tally_core::models::{CategoryNode, TargetOutcome};
use tally_core::reports::{category_breakdown, category_monthly_averages, monthly_averages};
use tally_core::trend::{balance_series, days_to_target, outlook, project};
use tally_core::{
    apply, build_report, Dataset, FilterSpec, FilteredView, Flow, ProjectionConfig, ReportOptions,
    YearMonth,
};

use super::truncate;

/// Resolve a period string to optional (from_date, to_date) bounds
///
/// `all` leaves both ends open. Custom dates replace the matching bound.
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    resolve_period_at(period, custom_from, custom_to, Utc::now().date_naive())
}

pub fn resolve_period_at(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
    today: NaiveDate,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let this_month = YearMonth::from_date(today);

    let (mut from, mut to) = match period.to_lowercase().as_str() {
        "all" => (None, None),
        "this-month" => (Some(this_month.first_day()), Some(today)),
        "last-month" => {
            let last_day = this_month
                .first_day()
                .pred_opt()
                .context("Date out of range")?;
            (Some(YearMonth::from_date(last_day).first_day()), Some(last_day))
        }
        "this-year" => {
            let from = YearMonth::new(today.year(), 1).context("Date out of range")?;
            (Some(from.first_day()), Some(today))
        }
        "last-30-days" => (Some(today - Duration::days(30)), Some(today)),
        "last-90-days" => (Some(today - Duration::days(90)), Some(today)),
        "last-12-months" => {
            let from = YearMonth::new(today.year() - 1, today.month())
                .context("Date out of range")?
                .next();
            (Some(from.first_day()), Some(today))
        }
        _ => anyhow::bail!("Unknown period: {}. Available: this-month, last-month, this-year, last-30-days, last-90-days, last-12-months, all", period),
    };

    if let Some(value) = custom_from {
        from = Some(
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .context("Invalid --from date format (use YYYY-MM-DD)")?,
        );
    }
    if let Some(value) = custom_to {
        to = Some(
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .context("Invalid --to date format (use YYYY-MM-DD)")?,
        );
    }

    Ok((from, to))
}

fn print_view_header(title: &str, view: &FilteredView<'_>) -> bool {
    println!();
    println!("{}", title);
    match view.date_range() {
        Some((first, last)) => println!("   Period: {}", format_date_range(first, last)),
        None => {
            println!("   ─────────────────────────────────────────────────────────────");
            println!("   No transactions match the current filter.");
            return false;
        }
    }
    println!("   ─────────────────────────────────────────────────────────────");
    true
}

fn print_nodes(nodes: &[CategoryNode], grand_total: f64) {
    println!(
        "   {:25} │ {:>12} │ {:>6} │ {:>5}",
        "Category", "Amount", "%", "Count"
    );
    println!("   ──────────────────────────┼──────────────┼────────┼───────");

    fn print_node(node: &CategoryNode, indent: usize, grand_total: f64) {
        let prefix = "  ".repeat(indent);
        let share = if grand_total > 0.0 {
            node.amount.abs() / grand_total * 100.0
        } else {
            0.0
        };
        println!(
            "   {:25} │ {:>12} │ {:>5.1}% │ {:>5}",
            format!("{}{}", prefix, truncate(&node.name, 25 - prefix.len())),
            format_money(node.amount),
            share,
            node.transaction_count
        );
        for child in &node.children {
            print_node(child, indent + 1, grand_total);
        }
    }

    for node in nodes {
        print_node(node, 0, grand_total);
    }
}

pub fn cmd_report_breakdown(dataset: &Dataset, spec: &FilterSpec, flow: Flow) -> Result<()> {
    let view = apply(dataset, spec);
    if !print_view_header(&format!("📊 Category Breakdown ({})", flow), &view) {
        return Ok(());
    }

    let breakdown = category_breakdown(&view, flow);
    if breakdown.is_empty() {
        println!("   No {} amounts in this period.", flow);
        return Ok(());
    }

    println!("   Total: {}", format_money(breakdown.total));
    println!();
    let grand_total: f64 = breakdown.categories.iter().map(|c| c.amount.abs()).sum();
    print_nodes(&breakdown.categories, grand_total);

    Ok(())
}

pub fn cmd_report_monthly(dataset: &Dataset, spec: &FilterSpec, fill_missing: bool) -> Result<()> {
    let view = apply(dataset, spec);
    if !print_view_header("📅 Monthly Income and Expenses", &view) {
        return Ok(());
    }

    let report = monthly_averages(&view, fill_missing);

    println!(
        "   {:8} │ {:>12} │ {:>12} │ {:>10} │ {:>10} │ {:>5}",
        "Month", "Income", "Expenses", "Avg in", "Avg out", "Count"
    );
    println!("   ─────────┼──────────────┼──────────────┼────────────┼────────────┼───────");

    for month in &report.months {
        println!(
            "   {:8} │ {:>12} │ {:>12} │ {:>10} │ {:>10} │ {:>5}",
            month.month.to_string(),
            format_money(month.income),
            format_money(month.expense),
            format_money(month.average_income),
            format_money(month.average_expense),
            month.transaction_count
        );
    }

    println!("   ─────────┼──────────────┼──────────────┼────────────┼────────────┼───────");
    println!(
        "   Average over {} month(s): income {} / expenses {}",
        report.month_count,
        format_money(report.average_income),
        format_money(report.average_expense)
    );

    Ok(())
}

pub fn cmd_report_averages(dataset: &Dataset, spec: &FilterSpec) -> Result<()> {
    let view = apply(dataset, spec);
    if !print_view_header("📉 Average Monthly Spending", &view) {
        return Ok(());
    }

    let averages = category_monthly_averages(&view);
    if averages.is_empty() {
        println!("   No expenses in this period.");
        return Ok(());
    }

    println!("   Per month: {}", format_money(averages.total));
    println!();
    print_nodes(&averages.categories, averages.total);

    Ok(())
}

/// Serialize the full aggregate report, to `output` or stdout
pub fn cmd_report_export(
    dataset: &Dataset,
    spec: &FilterSpec,
    options: &ReportOptions,
    output: Option<&Path>,
) -> Result<()> {
    let view = apply(dataset, spec);
    let report = build_report(&view, options);
    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize report to JSON")?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "✅ Exported report over {} transactions to {}",
                view.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

pub fn cmd_report_trend(
    dataset: &Dataset,
    spec: &FilterSpec,
    projection: &ProjectionConfig,
    target: Option<f64>,
) -> Result<()> {
    let view = apply(dataset, spec);
    if !print_view_header("📈 Balance Trend", &view) {
        return Ok(());
    }

    let series = balance_series(&view);
    let trend = project(&series, projection);

    if let Some(stats) = outlook(&series) {
        println!("   Current balance: {}", format_money(stats.current_balance));
        println!(
            "   Change: {}/day, {}/month over {} days",
            format_money(stats.daily_rate),
            format_money(stats.monthly_rate),
            stats.days_in_data
        );

        if let Some(target) = target {
            let today = Utc::now().date_naive();
            match days_to_target(stats.current_balance, target, stats.monthly_rate, today) {
                TargetOutcome::AlreadyReached => {
                    println!("   🎯 Target {} already reached", format_money(target))
                }
                TargetOutcome::Never => println!(
                    "   🎯 Target {} is not reachable at the current rate",
                    format_money(target)
                ),
                TargetOutcome::Reached { days, date } => println!(
                    "   🎯 Target {} reached in {} days ({})",
                    format_money(target),
                    days,
                    date
                ),
            }
        }
    }

    if trend.projection.is_empty() {
        println!();
        println!("   Not enough data points to project the balance.");
        return Ok(());
    }

    println!();
    println!("   {:12} │ {:>12}", "Date", "Projected");
    println!("   ─────────────┼──────────────");
    for point in &trend.projection {
        println!(
            "   {:12} │ {:>12}",
            point.date.to_string(),
            format_money(point.balance)
        );
    }
    if let Some(slope) = trend.slope_per_day {
        println!("   Fitted slope: {}/day", format_money(slope));
    }

    Ok(())
}
