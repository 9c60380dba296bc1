//! Filtered view and report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use tally_core::models::{BalanceOutlook, CategoryBreakdown, Flow, TargetOutcome};
use tally_core::reports::{build_report, category_monthly_averages};
use tally_core::trend::{balance_series, days_to_target, outlook};
use tally_core::{
    apply, AggregateReport, Config, Dataset, FilterSpec, FilteredView, Transaction,
};

/// Query parameters shared by every view endpoint
///
/// Each request carries the full filter; the server keeps no per-client
/// filter state.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    /// Comma-separated category names
    pub categories: Option<String>,
    pub show_hidden: Option<bool>,
    /// Comma-separated transaction ids to hide
    pub hidden: Option<String>,
    /// Case-insensitive text in description, category or subcategory
    pub search: Option<String>,
    /// Max rows for the transactions grid
    pub limit: Option<usize>,
    /// Breakdown flow: all, income or expense
    pub flow: Option<String>,
    pub fill_missing: Option<bool>,
    /// Target balance for the outlook
    pub target: Option<f64>,
}

impl DashboardQuery {
    fn filter_spec(&self, config: &Config) -> Result<FilterSpec, AppError> {
        let from = parse_date(self.from.as_deref(), "from")?;
        let to = parse_date(self.to.as_deref(), "to")?;

        let mut spec = config
            .filter()
            .date_from(from)
            .date_to(to)
            .categories(split_list(self.categories.as_deref()))
            .search(self.search.as_deref())
            .show_hidden(self.show_hidden.unwrap_or(false));

        for id in split_list(self.hidden.as_deref()) {
            let id: usize = id
                .parse()
                .map_err(|_| AppError::bad_request(&format!("Invalid hidden id: {}", id)))?;
            spec = spec.hide(id);
        }

        Ok(spec)
    }
}

fn parse_date(value: Option<&str>, label: &str) -> Result<Option<NaiveDate>, AppError> {
    value
        .filter(|s| !s.is_empty())
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request(&format!("Invalid {} date format (use YYYY-MM-DD)", label)))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Run `f` over the loaded dataset and the parsed filter
fn with_dataset<T>(
    state: &AppState,
    params: &DashboardQuery,
    f: impl FnOnce(&Dataset, &FilterSpec) -> T,
) -> Result<T, AppError> {
    let spec = params.filter_spec(&state.config)?;
    let guard = state.read_dataset()?;
    let dataset = guard
        .as_ref()
        .ok_or_else(|| AppError::not_found("No dataset loaded"))?;
    Ok(f(dataset, &spec))
}

/// Run `f` over the filtered view of the loaded dataset
fn with_view<T>(
    state: &AppState,
    params: &DashboardQuery,
    f: impl FnOnce(&FilteredView<'_>) -> T,
) -> Result<T, AppError> {
    with_dataset(state, params, |dataset, spec| f(&apply(dataset, spec)))
}

/// Transactions grid response
#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    /// Rows matching the filter before `limit` is applied
    pub total: usize,
    /// Rows matching the filter without the text search
    pub available: usize,
    pub transactions: Vec<Transaction>,
}

/// GET /api/transactions - Filtered rows in date order
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let limit = params.limit.unwrap_or(usize::MAX);
    let response = with_dataset(&state, &params, |dataset, spec| {
        let view = apply(dataset, spec);
        let available = if spec.search.is_some() {
            apply(dataset, &spec.clone().search(None)).len()
        } else {
            view.len()
        };
        TransactionsResponse {
            total: view.len(),
            available,
            transactions: view.iter().take(limit).cloned().collect(),
        }
    })?;
    Ok(Json(response))
}

/// GET /api/report - Totals, category breakdown, monthly averages and trend
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<AggregateReport>, AppError> {
    let mut options = state.config.report_options();
    if let Some(flow) = params.flow.as_deref() {
        options.flow = flow
            .parse::<Flow>()
            .map_err(|e| AppError::bad_request(&e))?;
    }
    if let Some(fill) = params.fill_missing {
        options.fill_missing = fill;
    }

    let report = with_view(&state, &params, |view| build_report(view, &options))?;
    Ok(Json(report))
}

/// GET /api/report/averages - Average monthly spending per category
pub async fn get_category_averages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<CategoryBreakdown>, AppError> {
    let averages = with_view(&state, &params, category_monthly_averages)?;
    Ok(Json(averages))
}

/// Balance outlook response
#[derive(Debug, Serialize)]
pub struct OutlookResponse {
    pub outlook: Option<BalanceOutlook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TargetOutcome>,
}

/// GET /api/outlook - Historical balance rate and optional target projection
pub async fn get_outlook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<OutlookResponse>, AppError> {
    if params.target.is_some_and(|t| !t.is_finite()) {
        return Err(AppError::bad_request("Target must be a finite number"));
    }

    let outlook = with_view(&state, &params, |view| outlook(&balance_series(view)))?;
    let today = Utc::now().date_naive();

    let outcome = match (outlook.as_ref(), params.target) {
        (Some(o), Some(target)) => Some(days_to_target(
            o.current_balance,
            target,
            o.monthly_rate,
            today,
        )),
        _ => None,
    };

    Ok(Json(OutlookResponse {
        outlook,
        target: params.target,
        outcome,
    }))
}
