//! Domain models for Tally

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single row of a transaction file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable row number: source order on load, appended after a merge
    pub id: usize,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    /// May be empty
    pub subcategory: String,
    /// Negative for expenses, positive for income
    pub amount: f64,
    /// Running account balance after this transaction
    pub balance: f64,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// A calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Returns None if `month` is not in 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// The following calendar month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid month: {} (use YYYY-MM)", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid month: {} (use YYYY-MM)", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month: {} (use YYYY-MM)", s))?;
        Self::new(year, month).ok_or_else(|| format!("Invalid month: {} (use YYYY-MM)", s))
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// The full, immutable set of transactions loaded for a session
///
/// Always non-empty and sorted by date ascending. Build one with
/// [`Dataset::from_transactions`] or the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    transactions: Vec<Transaction>,
    first_date: NaiveDate,
    last_date: NaiveDate,
}

impl Dataset {
    /// Number rows in input order, sort by date and validate
    pub fn from_transactions(mut transactions: Vec<Transaction>) -> Result<Self> {
        for (id, tx) in transactions.iter_mut().enumerate() {
            tx.id = id;
        }
        Self::from_numbered(transactions)
    }

    /// Keep the ids already assigned and order by (date, id)
    pub(crate) fn from_numbered(mut transactions: Vec<Transaction>) -> Result<Self> {
        transactions.sort_by_key(|tx| (tx.date, tx.id));

        let (first_date, last_date) = match (transactions.first(), transactions.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(Error::Empty),
        };

        Ok(Self {
            transactions,
            first_date,
            last_date,
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Always false for a constructed dataset
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// First id not used by any row
    pub fn next_id(&self) -> usize {
        self.transactions.iter().map(|tx| tx.id + 1).max().unwrap_or(0)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_date, self.last_date)
    }

    /// Distinct category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.transactions
            .iter()
            .map(|tx| tx.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Category -> sorted non-empty subcategories
    pub fn subcategories(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for tx in &self.transactions {
            let entry = map.entry(tx.category.clone()).or_default();
            if !tx.subcategory.is_empty() {
                entry.insert(tx.subcategory.clone());
            }
        }
        map.into_iter()
            .map(|(cat, subs)| (cat, subs.into_iter().collect()))
            .collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            transaction_count: self.len(),
            first_date: self.first_date,
            last_date: self.last_date,
            categories: self.categories(),
            subcategories: self.subcategories(),
        }
    }
}

/// Supported transaction file layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Comma-separated, ISO dates, six named columns
    Native,
    /// CaixaBank export: semicolon-separated with a two-line preamble
    Caixabank,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Caixabank => "caixabank",
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" | "csv" => Ok(Self::Native),
            "caixabank" | "caixa" => Ok(Self::Caixabank),
            _ => Err(format!("Unknown file format: {}", s)),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of merging an imported file into an existing dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub added: usize,
    pub skipped: usize,
}

/// Bounds and category listing for a loaded dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub transaction_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub categories: Vec<String>,
    pub subcategories: BTreeMap<String, Vec<String>>,
}

// ========== Report Models ==========

/// Which amounts a category breakdown considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Signed sums of every row
    #[default]
    All,
    /// Positive amounts only
    Income,
    /// Magnitudes of negative amounts only
    Expense,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "net" => Ok(Self::All),
            "income" => Ok(Self::Income),
            "expense" | "expenses" => Ok(Self::Expense),
            _ => Err(format!("Unknown flow: {}", s)),
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Income and expense KPIs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: f64,
    /// Reported as a positive magnitude
    pub expense: f64,
    pub net: f64,
    pub transaction_count: usize,
}

/// A node in the category hierarchy (category, then subcategory)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: String,
    pub amount: f64,
    pub transaction_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

/// Two-level category breakdown (treemap input)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub flow: Flow,
    pub total: f64,
    pub categories: Vec<CategoryNode>,
}

impl CategoryBreakdown {
    /// Amount for a top-level category, if present
    pub fn get(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .find(|node| node.name == category)
            .map(|node| node.amount)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Income/expense figures for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    pub month: YearMonth,
    pub income: f64,
    pub expense: f64,
    /// Mean income transaction in the month
    pub average_income: f64,
    /// Mean expense transaction in the month (positive)
    pub average_expense: f64,
    pub income_count: usize,
    pub expense_count: usize,
    pub transaction_count: usize,
}

/// Monthly breakdown plus per-month averages across the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverages {
    pub months: Vec<MonthlyAverage>,
    /// Number of months that had at least one transaction
    pub month_count: usize,
    pub average_income: f64,
    pub average_expense: f64,
}

/// One (date, balance) sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub balance: f64,
}

/// Historical balance series and its forward projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub history: Vec<TrendPoint>,
    pub projection: Vec<TrendPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slope_per_day: Option<f64>,
}

/// Balance movement metrics over the whole series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceOutlook {
    pub current_balance: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub days_in_data: i64,
    pub daily_rate: f64,
    pub monthly_rate: f64,
}

/// Whether and when a target balance is reached at a given rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetOutcome {
    AlreadyReached,
    /// The rate is zero or moves the balance away from the target
    Never,
    Reached { days: i64, date: NaiveDate },
}

/// Everything the dashboard shows for one filtered view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub totals: Totals,
    pub breakdown: CategoryBreakdown,
    pub monthly: MonthlyAverages,
    pub trend: TrendReport,
}
