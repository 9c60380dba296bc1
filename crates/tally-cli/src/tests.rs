//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use tally_core::{
    apply, load, Config, Dataset, FileFormat, Flow, ProjectionConfig, ReportOptions, YearMonth,
};
use tempfile::TempDir;

use crate::cli::{Cli, Commands, FilterArgs, ReportType};
use crate::commands::{self, format_amount, truncate};

const SAMPLE_CSV: &str = r#"Date,Description,Category,Subcategory,Amount,Balance
2024-01-05,Salary,Income,Salary,2000,2000
2024-01-10,Rent,Housing,Rent,-800,1200
2024-01-15,To savings,Hidden,,-300,900
2024-02-01,Mercadona,Food,Supermarket,-45.5,854.5
2024-02-05,Salary,Income,Salary,2000,2854.5
2024-03-02,Cinema,Leisure,,-12,2842.5"#;

const CAIXABANK_CSV: &str = "Movimientos de la cuenta;;;\n\
                             Cuenta: ES00 0000;;;\n\
                             Concepto;Fecha;Importe;Saldo\n\
                             NOMINA EMPRESA;05/01/2024;2000.00;2.000,00EUR\n\
                             BIZUM ENVIADO;04/03/2024;-25.00;2.817,50EUR\n";

fn sample() -> Dataset {
    load(SAMPLE_CSV.as_bytes()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn row_count(path: &Path) -> usize {
    commands::load_dataset(path).unwrap().len()
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_report_with_filters() {
    let cli = Cli::try_parse_from([
        "tally",
        "--data",
        "mine.csv",
        "report",
        "breakdown",
        "--flow",
        "expense",
        "--category",
        "Food",
        "--category",
        "Housing",
        "--hide",
        "3",
    ])
    .unwrap();

    assert_eq!(cli.data, PathBuf::from("mine.csv"));
    match cli.command {
        Commands::Report {
            report_type: ReportType::Breakdown { flow, filter },
        } => {
            assert_eq!(flow, Flow::Expense);
            assert_eq!(filter.categories, vec!["Food", "Housing"]);
            assert_eq!(filter.hidden, vec![3]);
            assert_eq!(filter.period, "all");
        }
        _ => panic!("expected report breakdown"),
    }
}

#[test]
fn test_parse_defaults() {
    let cli = Cli::try_parse_from(["tally", "transactions"]).unwrap();
    assert_eq!(cli.data, PathBuf::from("transactions.csv"));
    assert!(cli.config.is_none());
    match cli.command {
        Commands::Transactions { limit, filter } => {
            assert_eq!(limit, 20);
            assert!(!filter.show_hidden);
        }
        _ => panic!("expected transactions"),
    }
}

#[test]
fn test_parse_negative_target_and_months() {
    let cli = Cli::try_parse_from([
        "tally",
        "report",
        "trend",
        "--target",
        "-500",
        "--month-from",
        "2024-02",
    ])
    .unwrap();
    match cli.command {
        Commands::Report {
            report_type: ReportType::Trend { target, filter },
        } => {
            assert_eq!(target, Some(-500.0));
            assert_eq!(filter.month_from, YearMonth::new(2024, 2));
        }
        _ => panic!("expected report trend"),
    }
}

#[test]
fn test_parse_rejects_bad_values() {
    assert!(Cli::try_parse_from(["tally", "report", "breakdown", "--flow", "up"]).is_err());
    assert!(Cli::try_parse_from(["tally", "summary", "--month-from", "2024-13"]).is_err());
    assert!(
        Cli::try_parse_from(["tally", "import", "--file", "x.csv", "--format", "ofx"]).is_err()
    );
}

#[test]
fn test_parse_target_must_be_finite() {
    for bad in ["NaN", "inf", "-inf", "lots"] {
        assert!(
            Cli::try_parse_from(["tally", "report", "trend", "--target", bad]).is_err(),
            "accepted --target {}",
            bad
        );
    }
}

// ========== Period Resolution Tests ==========

#[test]
fn test_resolve_period_all_is_unbounded() {
    let (from, to) = commands::resolve_period_at("all", None, None, date(2024, 5, 20)).unwrap();
    assert_eq!(from, None);
    assert_eq!(to, None);
}

#[test]
fn test_resolve_period_named() {
    let today = date(2024, 5, 20);

    let (from, to) = commands::resolve_period_at("this-month", None, None, today).unwrap();
    assert_eq!(from, Some(date(2024, 5, 1)));
    assert_eq!(to, Some(today));

    let (from, to) = commands::resolve_period_at("this-year", None, None, today).unwrap();
    assert_eq!(from, Some(date(2024, 1, 1)));
    assert_eq!(to, Some(today));

    let (from, _) = commands::resolve_period_at("last-30-days", None, None, today).unwrap();
    assert_eq!(from, Some(date(2024, 4, 20)));

    let (from, _) = commands::resolve_period_at("last-12-months", None, None, today).unwrap();
    assert_eq!(from, Some(date(2023, 6, 1)));
}

#[test]
fn test_resolve_last_month_crosses_year() {
    let (from, to) =
        commands::resolve_period_at("last-month", None, None, date(2024, 1, 15)).unwrap();
    assert_eq!(from, Some(date(2023, 12, 1)));
    assert_eq!(to, Some(date(2023, 12, 31)));

    let (from, to) =
        commands::resolve_period_at("Last-Month", None, None, date(2024, 3, 10)).unwrap();
    assert_eq!(from, Some(date(2024, 2, 1)));
    assert_eq!(to, Some(date(2024, 2, 29)));
}

#[test]
fn test_resolve_period_custom_dates_override() {
    let today = date(2024, 5, 20);
    let (from, to) =
        commands::resolve_period_at("this-month", Some("2024-01-01"), None, today).unwrap();
    assert_eq!(from, Some(date(2024, 1, 1)));
    assert_eq!(to, Some(today));

    let (from, to) = commands::resolve_period_at("all", None, Some("2024-02-29"), today).unwrap();
    assert_eq!(from, None);
    assert_eq!(to, Some(date(2024, 2, 29)));
}

#[test]
fn test_resolve_period_errors() {
    let today = date(2024, 5, 20);
    let err = commands::resolve_period_at("fortnight", None, None, today).unwrap_err();
    assert!(err.to_string().contains("Unknown period"));

    let err = commands::resolve_period_at("all", Some("20/01/2024"), None, today).unwrap_err();
    assert!(err.to_string().contains("--from"));
}

// ========== Filter Tests ==========

#[test]
fn test_build_filter_hides_reserved_category() {
    let dataset = sample();
    let spec = commands::build_filter(&Config::default(), &dataset, &FilterArgs::default()).unwrap();
    assert_eq!(apply(&dataset, &spec).len(), 5);

    let args = FilterArgs {
        show_hidden: true,
        ..FilterArgs::default()
    };
    let spec = commands::build_filter(&Config::default(), &dataset, &args).unwrap();
    assert_eq!(apply(&dataset, &spec).len(), 6);
}

#[test]
fn test_build_filter_uses_configured_hidden_category() {
    let dataset = sample();
    let config = Config::parse(r#"hidden_category = "Leisure""#).unwrap();
    let spec = commands::build_filter(&config, &dataset, &FilterArgs::default()).unwrap();

    let view = apply(&dataset, &spec);
    assert_eq!(view.len(), 5);
    assert!(view.iter().all(|tx| tx.category != "Leisure"));
    assert!(view.iter().any(|tx| tx.category == "Hidden"));
}

#[test]
fn test_build_filter_categories_and_hidden_ids() {
    let dataset = sample();
    let args = FilterArgs {
        categories: vec!["Income".to_string()],
        hidden: vec![0],
        ..FilterArgs::default()
    };
    let spec = commands::build_filter(&Config::default(), &dataset, &args).unwrap();

    let view = apply(&dataset, &spec);
    assert_eq!(view.len(), 1);
    assert_eq!(view.rows()[0].date, date(2024, 2, 5));
}

#[test]
fn test_build_filter_search() {
    let dataset = sample();
    let cli = Cli::try_parse_from(["tally", "transactions", "--search", "salary"]).unwrap();
    let Commands::Transactions { filter, .. } = cli.command else {
        panic!("expected transactions");
    };

    let spec = commands::build_filter(&Config::default(), &dataset, &filter).unwrap();
    let view = apply(&dataset, &spec);
    assert_eq!(view.len(), 2);
    assert!(view.iter().all(|tx| tx.description == "Salary"));
    assert!(commands::cmd_transactions(&dataset, &spec, 20).is_ok());
}

#[test]
fn test_build_filter_month_range() {
    let dataset = sample();
    let args = FilterArgs {
        month_from: YearMonth::new(2024, 2),
        month_to: YearMonth::new(2024, 6),
        // Month bounds take precedence over dates
        from: Some("2023-01-01".to_string()),
        ..FilterArgs::default()
    };
    let spec = commands::build_filter(&Config::default(), &dataset, &args).unwrap();

    let view = apply(&dataset, &spec);
    assert_eq!(view.len(), 3);
    assert_eq!(view.date_range(), Some((date(2024, 2, 1), date(2024, 3, 2))));
}

#[test]
fn test_build_filter_month_range_open_end() {
    let dataset = sample();
    let args = FilterArgs {
        month_to: YearMonth::new(2024, 1),
        show_hidden: true,
        ..FilterArgs::default()
    };
    let spec = commands::build_filter(&Config::default(), &dataset, &args).unwrap();
    assert_eq!(apply(&dataset, &spec).len(), 3);
}

#[test]
fn test_build_filter_rejects_inverted_months() {
    let dataset = sample();
    let args = FilterArgs {
        month_from: YearMonth::new(2024, 3),
        month_to: YearMonth::new(2024, 1),
        ..FilterArgs::default()
    };
    assert!(commands::build_filter(&Config::default(), &dataset, &args).is_err());
}

// ========== Load Tests ==========

#[test]
fn test_load_dataset_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = commands::load_dataset(&dir.path().join("nope.csv")).unwrap_err();
    assert!(err.to_string().contains("Failed to open file"));
}

#[test]
fn test_load_dataset_reports_row_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "bad.csv",
        "Date,Description,Category,Subcategory,Amount,Balance\n2024-01-05,Salary,Income,,lots,2000\n",
    );

    let err = commands::load_dataset(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to load"));
    assert!(format!("{:#}", err).contains("row 1"));
}

#[test]
fn test_load_dataset_detects_caixabank() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "caixa.csv", CAIXABANK_CSV);

    let dataset = commands::load_dataset(&path).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.transactions()[1].balance, 2817.5);
}

// ========== Import Command Tests ==========

#[test]
fn test_cmd_import_creates_data_file() {
    let dir = TempDir::new().unwrap();
    let source = write_file(&dir, "export.csv", SAMPLE_CSV);
    let data = dir.path().join("transactions.csv");

    let stats = commands::cmd_import(&data, &source, None).unwrap();
    assert_eq!(stats.added, 6);
    assert_eq!(stats.skipped, 0);
    assert_eq!(commands::load_dataset(&data).unwrap(), sample());
}

#[test]
fn test_cmd_import_merges_and_skips_duplicates() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "transactions.csv", SAMPLE_CSV);
    let source = write_file(&dir, "caixa.csv", CAIXABANK_CSV);

    // "NOMINA EMPRESA" differs from "Salary", so both rows are new
    let stats = commands::cmd_import(&data, &source, Some(FileFormat::Caixabank)).unwrap();
    assert_eq!(stats.added, 2);
    assert_eq!(row_count(&data), 8);

    // Importing the same file again adds nothing
    let stats = commands::cmd_import(&data, &source, None).unwrap();
    assert_eq!(stats.added, 0);
    assert_eq!(stats.skipped, 2);
    assert_eq!(row_count(&data), 8);
}

#[test]
fn test_cmd_import_keeps_hidden_ids() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "transactions.csv", SAMPLE_CSV);
    let source = write_file(
        &dir,
        "early.csv",
        "Date,Description,Category,Subcategory,Amount,Balance\n\
         2024-01-01,Bonus,Income,,100,100\n",
    );
    let args = FilterArgs {
        hidden: vec![1],
        ..FilterArgs::default()
    };

    let before = commands::load_dataset(&data).unwrap();
    let spec = commands::build_filter(&Config::default(), &before, &args).unwrap();
    assert!(apply(&before, &spec).iter().all(|tx| tx.description != "Rent"));

    commands::cmd_import(&data, &source, None).unwrap();

    // Rent keeps id 1 after an earlier row is merged in and the file reloaded
    let after = commands::load_dataset(&data).unwrap();
    assert_eq!(after.transactions()[0].description, "Bonus");
    let spec = commands::build_filter(&Config::default(), &after, &args).unwrap();
    let view = apply(&after, &spec);
    assert_eq!(view.len(), 5);
    assert!(view.iter().all(|tx| tx.description != "Rent"));
}

#[test]
fn test_cmd_import_invalid_file_leaves_data_untouched() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "transactions.csv", SAMPLE_CSV);
    let source = write_file(&dir, "bad.csv", "Date,Amount\n2024-01-01,5\n");

    let err = commands::cmd_import(&data, &source, None).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
    assert_eq!(fs::read_to_string(&data).unwrap(), SAMPLE_CSV);
}

#[test]
fn test_cmd_import_wrong_forced_format() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("transactions.csv");
    let source = write_file(&dir, "export.csv", SAMPLE_CSV);

    assert!(commands::cmd_import(&data, &source, Some(FileFormat::Caixabank)).is_err());
    assert!(!data.exists());
}

// ========== Generate Command Tests ==========

#[test]
fn test_cmd_generate_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.csv");
    let second = dir.path().join("b.csv");

    commands::cmd_generate(&first, 30, Some(7)).unwrap();
    commands::cmd_generate(&second, 30, Some(7)).unwrap();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );

    let dataset = commands::load_dataset(&first).unwrap();
    // At least one transaction per day over 31 days
    assert!(dataset.len() >= 31);
}

// ========== View Command Tests ==========

#[test]
fn test_view_commands_succeed() {
    let dataset = sample();
    let spec = commands::build_filter(&Config::default(), &dataset, &FilterArgs::default()).unwrap();

    assert!(commands::cmd_summary(&dataset, &spec).is_ok());
    assert!(commands::cmd_transactions(&dataset, &spec, 3).is_ok());
    assert!(commands::cmd_categories(&dataset).is_ok());
    assert!(commands::cmd_report_breakdown(&dataset, &spec, Flow::All).is_ok());
    assert!(commands::cmd_report_breakdown(&dataset, &spec, Flow::Income).is_ok());
    assert!(commands::cmd_report_monthly(&dataset, &spec, true).is_ok());
    assert!(commands::cmd_report_averages(&dataset, &spec).is_ok());
    assert!(
        commands::cmd_report_trend(&dataset, &spec, &ProjectionConfig::default(), Some(0.0))
            .is_ok()
    );
}

#[test]
fn test_view_commands_with_empty_filter() {
    let dataset = sample();
    let args = FilterArgs {
        categories: vec!["Travel".to_string()],
        ..FilterArgs::default()
    };
    let spec = commands::build_filter(&Config::default(), &dataset, &args).unwrap();

    assert!(commands::cmd_summary(&dataset, &spec).is_ok());
    assert!(commands::cmd_transactions(&dataset, &spec, 20).is_ok());
    assert!(commands::cmd_report_breakdown(&dataset, &spec, Flow::Expense).is_ok());
    assert!(commands::cmd_report_monthly(&dataset, &spec, false).is_ok());
    assert!(commands::cmd_report_averages(&dataset, &spec).is_ok());
    assert!(commands::cmd_report_trend(&dataset, &spec, &ProjectionConfig::default(), None).is_ok());
}

#[test]
fn test_cmd_report_export_writes_json() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.json");
    let dataset = sample();
    let spec = commands::build_filter(&Config::default(), &dataset, &FilterArgs::default()).unwrap();
    let options = ReportOptions {
        flow: Flow::Expense,
        ..ReportOptions::default()
    };

    commands::cmd_report_export(&dataset, &spec, &options, Some(&output)).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["totals"]["income"], 4000.0);
    assert_eq!(json["totals"]["expense"], 857.5);
    assert_eq!(json["breakdown"]["flow"], "expense");
    assert_eq!(json["breakdown"]["categories"][0]["name"], "Housing");
    assert_eq!(json["monthly"]["month_count"], 3);
}

// ========== Utility Tests ==========

#[test]
fn test_format_amount_pads_before_colour() {
    assert_eq!(format_amount(-45.5, 10, false), "    -45.50");
    assert_eq!(format_amount(2000.0, 10, false), "  +2000.00");
    assert_eq!(format_amount(0.0, 10, false), "      0.00");
    assert_eq!(format_amount(-0.0, 10, false), "      0.00");

    assert_eq!(format_amount(-45.5, 10, true), "\x1b[31m    -45.50\x1b[0m");
    assert_eq!(format_amount(2000.0, 10, true), "\x1b[32m  +2000.00\x1b[0m");
    // Zero is neutral even on a terminal
    assert_eq!(format_amount(0.0, 10, true), "      0.00");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long description", 10), "this is...");
    assert_eq!(truncate("Alimentación y supermercado", 12), "Alimentac...");
}
