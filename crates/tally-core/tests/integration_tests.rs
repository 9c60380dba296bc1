//! Integration tests for tally-core
//!
//! These tests exercise the full load → filter → report workflow.

use chrono::NaiveDate;
use tally_core::{
    apply, build_report,
    filter::month_range,
    load, load_auto, merge,
    models::{Flow, TargetOutcome},
    reports::{category_breakdown, totals},
    trend::{balance_series, days_to_target, outlook},
    write_csv, Dataset, FilterSpec, ReportOptions, SampleGenerator, YearMonth,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Six months of household data including transfers marked as hidden
fn household_csv() -> &'static str {
    r#"Date,Description,Category,Subcategory,Amount,Balance
2024-01-01,Salary,Income,Salary,2500,2500
2024-01-03,Rent,Housing,Rent,-900,1600
2024-01-15,Mercadona,Food,Supermarket,-120.40,1479.60
2024-01-20,Move to savings,Hidden,,-500,979.60
2024-02-01,Salary,Income,Salary,2500,3479.60
2024-02-03,Rent,Housing,Rent,-900,2579.60
2024-02-14,Restaurant,Food,Restaurants,-64.50,2515.10
2024-03-01,Salary,Income,Salary,2500,5015.10
2024-03-03,Rent,Housing,Rent,-900,4115.10
2024-03-10,Netflix,Subscriptions,Streaming,-12.99,4102.11
2024-03-10,Spotify,Subscriptions,Streaming,-10.99,4091.12"#
}

#[test]
fn test_end_to_end_salary_and_rent() {
    let csv = r#"Date,Description,Category,Subcategory,Amount,Balance
2024-01-05,Salary,Income,,2000,2000
2024-01-10,Rent,Housing,,-800,1200"#;

    let dataset = load(csv.as_bytes()).expect("Failed to load CSV");
    let (first, last) = dataset.date_range();
    let spec = FilterSpec::new().date_range(first, last);
    let view = apply(&dataset, &spec);

    let totals = totals(&view);
    assert_eq!(totals.income, 2000.0);
    assert_eq!(totals.expense, 800.0);

    let breakdown = category_breakdown(&view, Flow::All);
    assert_eq!(breakdown.categories.len(), 2);
    assert_eq!(breakdown.get("Income"), Some(2000.0));
    assert_eq!(breakdown.get("Housing"), Some(-800.0));

    // Two balance points: slope is the endpoint slope
    let report = build_report(&view, &ReportOptions::default());
    assert_eq!(report.trend.slope_per_day, Some((1200.0 - 2000.0) / 5.0));
    assert_eq!(report.trend.projection.len(), 3);
}

#[test]
fn test_full_dashboard_workflow() {
    let dataset = load(household_csv().as_bytes()).expect("Failed to load CSV");
    assert_eq!(dataset.len(), 11);

    // Whole-month selection Feb..Mar, transfers hidden by default
    let (from, to) = month_range(
        YearMonth::new(2024, 2).unwrap(),
        YearMonth::new(2024, 3).unwrap(),
        &dataset,
    );
    assert_eq!(to, date(2024, 3, 10));

    let view = apply(&dataset, &FilterSpec::new().date_range(from, to));
    assert_eq!(view.len(), 7);

    let report = build_report(&view, &ReportOptions::default());
    assert_eq!(report.totals.income, 5000.0);
    assert!((report.totals.expense - 1888.48).abs() < 1e-9);
    assert_eq!(report.monthly.month_count, 2);
    assert_eq!(report.trend.history.len(), 6);
    assert_eq!(report.trend.history.last().unwrap().balance, 4091.12);

    // Same-date rows collapse into the last balance
    let series = balance_series(&view);
    assert_eq!(series.last().unwrap().date, date(2024, 3, 10));

    // The report serializes for the dashboard
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["monthly"]["months"][0]["month"], "2024-02");
    assert!(json["trend"]["projection"].is_array());
}

#[test]
fn test_show_hidden_changes_totals() {
    let dataset = load(household_csv().as_bytes()).unwrap();

    let hidden = totals(&apply(&dataset, &FilterSpec::new()));
    let shown = totals(&apply(&dataset, &FilterSpec::new().show_hidden(true)));

    assert_eq!(shown.transaction_count, hidden.transaction_count + 1);
    assert!((shown.expense - hidden.expense - 500.0).abs() < 1e-9);
}

#[test]
fn test_outlook_and_target() {
    let dataset = load(household_csv().as_bytes()).unwrap();
    let view = apply(&dataset, &FilterSpec::new().show_hidden(true));
    let series = balance_series(&view);

    let outlook = outlook(&series).expect("series is non-empty");
    assert_eq!(outlook.days_in_data, 70);
    assert!(outlook.monthly_rate > 0.0);

    let outcome = days_to_target(
        outlook.current_balance,
        outlook.current_balance + outlook.monthly_rate,
        outlook.monthly_rate,
        date(2024, 3, 10),
    );
    match outcome {
        TargetOutcome::Reached { days, .. } => assert!((29..=30).contains(&days)),
        other => panic!("expected target to be reached, got {:?}", other),
    }
}

#[test]
fn test_generate_export_and_merge() {
    let generated = SampleGenerator::new(date(2024, 1, 1), date(2024, 2, 29))
        .with_seed(1)
        .generate()
        .unwrap();

    let mut file = Vec::new();
    write_csv(&generated, &mut file).unwrap();
    let reloaded = load_auto(&file).unwrap();
    assert_eq!(reloaded, generated);

    // Re-importing the same file adds nothing
    let (merged, stats) = merge(&generated, reloaded).unwrap();
    assert_eq!(stats.added, 0);
    assert_eq!(stats.skipped, generated.len());
    assert_eq!(merged.len(), generated.len());
}

#[test]
fn test_empty_view_reports_zeroes() {
    let dataset: Dataset = load(household_csv().as_bytes()).unwrap();
    let spec = FilterSpec::new().category("Nonexistent");
    let view = apply(&dataset, &spec);

    let report = build_report(&view, &ReportOptions::default());
    assert_eq!(report.totals.income, 0.0);
    assert_eq!(report.totals.expense, 0.0);
    assert!(report.breakdown.categories.is_empty());
    assert!(report.monthly.months.is_empty());
    assert!(report.trend.projection.is_empty());
}
