//! Aggregates over a filtered view: KPIs, category breakdowns, monthly averages
//!
//! Every function here is total: an empty view yields zero totals and empty
//! breakdowns rather than an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::FilteredView;
use crate::models::{
    AggregateReport, CategoryBreakdown, CategoryNode, Flow, MonthlyAverage, MonthlyAverages,
    Totals, Transaction, YearMonth,
};
use crate::trend::{balance_series, project, ProjectionConfig};

/// Sums smaller than this are treated as net-zero
const ZERO_TOLERANCE: f64 = 1e-9;

/// Options for [`build_report`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub flow: Flow,
    /// Emit zero rows for months with no transactions
    pub fill_missing: bool,
    pub projection: ProjectionConfig,
}

/// Build every aggregate for a view
pub fn build_report(view: &FilteredView<'_>, options: &ReportOptions) -> AggregateReport {
    debug!("Building report over {} transactions", view.len());
    AggregateReport {
        totals: totals(view),
        breakdown: category_breakdown(view, options.flow),
        monthly: monthly_averages(view, options.fill_missing),
        trend: project(&balance_series(view), &options.projection),
    }
}

/// Total income (positive amounts) and expense (magnitude of negative amounts)
pub fn totals(view: &FilteredView<'_>) -> Totals {
    let income = view
        .iter()
        .filter(|tx| tx.is_income())
        .fold(0.0, |acc, tx| acc + tx.amount);
    let expense = view
        .iter()
        .filter(|tx| tx.is_expense())
        .fold(0.0, |acc, tx| acc + tx.amount)
        .abs();

    Totals {
        income,
        expense,
        net: income - expense,
        transaction_count: view.len(),
    }
}

/// Amount a transaction contributes under a flow, if any
fn flow_value(tx: &Transaction, flow: Flow) -> Option<f64> {
    match flow {
        Flow::All => Some(tx.amount),
        Flow::Income => tx.is_income().then_some(tx.amount),
        Flow::Expense => tx.is_expense().then_some(-tx.amount),
    }
}

#[derive(Default)]
struct GroupAcc {
    amount: f64,
    count: usize,
    children: BTreeMap<String, (f64, usize)>,
}

/// Category -> subcategory sums, omitting net-zero groups
pub fn category_breakdown(view: &FilteredView<'_>, flow: Flow) -> CategoryBreakdown {
    let mut groups: BTreeMap<&str, GroupAcc> = BTreeMap::new();

    for tx in view.iter() {
        let Some(value) = flow_value(tx, flow) else {
            continue;
        };

        let group = groups.entry(tx.category.as_str()).or_default();
        group.amount += value;
        group.count += 1;

        if !tx.subcategory.is_empty() {
            let child = group.children.entry(tx.subcategory.clone()).or_default();
            child.0 += value;
            child.1 += 1;
        }
    }

    let mut categories: Vec<CategoryNode> = groups
        .into_iter()
        .filter(|(_, group)| group.amount.abs() > ZERO_TOLERANCE)
        .map(|(name, group)| {
            let mut children: Vec<CategoryNode> = group
                .children
                .into_iter()
                .filter(|(_, (amount, _))| amount.abs() > ZERO_TOLERANCE)
                .map(|(name, (amount, count))| CategoryNode {
                    name,
                    amount,
                    transaction_count: count,
                    children: Vec::new(),
                })
                .collect();
            sort_nodes(&mut children);

            CategoryNode {
                name: name.to_string(),
                amount: group.amount,
                transaction_count: group.count,
                children,
            }
        })
        .collect();
    sort_nodes(&mut categories);

    let total = categories.iter().fold(0.0, |acc, node| acc + node.amount);

    CategoryBreakdown {
        flow,
        total,
        categories,
    }
}

/// Largest magnitude first, then by name
fn sort_nodes(nodes: &mut [CategoryNode]) {
    nodes.sort_by(|a, b| {
        b.amount
            .abs()
            .partial_cmp(&a.amount.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Per-month income and expense figures
///
/// Only months present in the view are counted for the overall averages.
/// With `fill_missing`, gaps between the first and last month are emitted as
/// explicit zero rows.
pub fn monthly_averages(view: &FilteredView<'_>, fill_missing: bool) -> MonthlyAverages {
    let mut months: BTreeMap<YearMonth, MonthlyAverage> = BTreeMap::new();

    for tx in view.iter() {
        let month = tx.month();
        let entry = months
            .entry(month)
            .or_insert_with(|| empty_month(month));

        entry.transaction_count += 1;
        if tx.is_income() {
            entry.income += tx.amount;
            entry.income_count += 1;
        } else if tx.is_expense() {
            entry.expense -= tx.amount;
            entry.expense_count += 1;
        }
    }

    for entry in months.values_mut() {
        if entry.income_count > 0 {
            entry.average_income = entry.income / entry.income_count as f64;
        }
        if entry.expense_count > 0 {
            entry.average_expense = entry.expense / entry.expense_count as f64;
        }
    }

    let month_count = months.len();
    let (income, expense) = months
        .values()
        .fold((0.0, 0.0), |(i, e), m| (i + m.income, e + m.expense));
    let (average_income, average_expense) = if month_count > 0 {
        (income / month_count as f64, expense / month_count as f64)
    } else {
        (0.0, 0.0)
    };

    let bounds = months
        .keys()
        .next()
        .copied()
        .zip(months.keys().next_back().copied());
    if fill_missing {
        if let Some((first, last)) = bounds {
            let mut current = first;
            while current < last {
                months.entry(current).or_insert_with(|| empty_month(current));
                current = current.next();
            }
        }
    }

    MonthlyAverages {
        months: months.into_values().collect(),
        month_count,
        average_income,
        average_expense,
    }
}

fn empty_month(month: YearMonth) -> MonthlyAverage {
    MonthlyAverage {
        month,
        income: 0.0,
        expense: 0.0,
        average_income: 0.0,
        average_expense: 0.0,
        income_count: 0,
        expense_count: 0,
        transaction_count: 0,
    }
}

/// Average monthly spending per category and subcategory
///
/// Expense magnitudes divided by the number of distinct months in the view.
pub fn category_monthly_averages(view: &FilteredView<'_>) -> CategoryBreakdown {
    let month_count = view
        .iter()
        .map(|tx| tx.month())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    let mut breakdown = category_breakdown(view, Flow::Expense);
    if month_count == 0 {
        return breakdown;
    }

    let divisor = month_count as f64;
    for node in &mut breakdown.categories {
        node.amount /= divisor;
        for child in &mut node.children {
            child.amount /= divisor;
        }
    }
    breakdown.total /= divisor;
    breakdown
}
