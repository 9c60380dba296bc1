//! Filter engine: date range, category selection, text search and hidden entries
//!
//! A [`FilterSpec`] is an explicit, rebuildable description of what the user
//! wants to see. [`apply`] turns a dataset and a spec into a [`FilteredView`]
//! that borrows the matching rows in their original order.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Dataset, Transaction, YearMonth};

/// Category label excluded unless `show_hidden` is set
pub const DEFAULT_HIDDEN_CATEGORY: &str = "Hidden";

/// User-selected constraints for a view of the dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive lower bound (None = unbounded)
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound (None = unbounded)
    pub date_to: Option<NaiveDate>,
    /// Empty means every category
    pub selected_categories: BTreeSet<String>,
    pub show_hidden: bool,
    pub hidden_category: String,
    /// Individually hidden transaction ids
    pub hidden_ids: BTreeSet<usize>,
    /// Case-insensitive text matched against description, category and subcategory
    pub search: Option<String>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            date_from: None,
            date_to: None,
            selected_categories: BTreeSet::new(),
            show_hidden: false,
            hidden_category: DEFAULT_HIDDEN_CATEGORY.to_string(),
            hidden_ids: BTreeSet::new(),
            search: None,
        }
    }
}

impl FilterSpec {
    /// Create a new filter that matches everything except hidden rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive lower date bound
    pub fn date_from(mut self, date: Option<NaiveDate>) -> Self {
        self.date_from = date;
        self
    }

    /// Set the inclusive upper date bound
    pub fn date_to(mut self, date: Option<NaiveDate>) -> Self {
        self.date_to = date;
        self
    }

    /// Set both date bounds
    pub fn date_range(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from(Some(from)).date_to(Some(to))
    }

    /// Add one category to the selection
    pub fn category(mut self, name: impl Into<String>) -> Self {
        self.selected_categories.insert(name.into());
        self
    }

    /// Add several categories to the selection
    pub fn categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_categories
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Include hidden rows
    pub fn show_hidden(mut self, value: bool) -> Self {
        self.show_hidden = value;
        self
    }

    /// Override the reserved hidden category label
    pub fn hidden_category(mut self, label: impl Into<String>) -> Self {
        self.hidden_category = label.into();
        self
    }

    /// Hide a single transaction by id
    pub fn hide(mut self, id: usize) -> Self {
        self.hidden_ids.insert(id);
        self
    }

    /// Unhide a previously hidden transaction
    pub fn unhide(mut self, id: usize) -> Self {
        self.hidden_ids.remove(&id);
        self
    }

    /// Only keep rows containing `term`; a blank term clears the search
    pub fn search(mut self, term: Option<&str>) -> Self {
        self.search = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        self
    }

    pub fn is_hidden(&self, id: usize) -> bool {
        self.hidden_ids.contains(&id)
    }

    /// Whether a single transaction passes every constraint
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.date_from.is_some_and(|from| tx.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| tx.date > to) {
            return false;
        }
        if !self.selected_categories.is_empty() && !self.selected_categories.contains(&tx.category)
        {
            return false;
        }
        if !self.show_hidden && (tx.category == self.hidden_category || self.is_hidden(tx.id)) {
            return false;
        }
        if let Some(term) = &self.search {
            return [&tx.description, &tx.category, &tx.subcategory]
                .iter()
                .any(|field| field.to_lowercase().contains(term.as_str()));
        }
        true
    }
}

/// The rows of a dataset that satisfy a filter, in dataset order
#[derive(Debug, Clone, Serialize)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Transaction>,
}

impl<'a> FilteredView<'a> {
    /// A view over already-selected rows; callers keep them in date order
    pub fn from_rows(rows: Vec<&'a Transaction>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[&'a Transaction] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last dates in the view
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

/// Apply a filter to a dataset
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> FilteredView<'a> {
    let rows = dataset
        .transactions()
        .iter()
        .filter(|tx| spec.matches(tx))
        .collect();
    FilteredView { rows }
}

/// Date bounds for a whole-month selection
///
/// Runs from the first day of `start` to the last day of `end`, clamped to
/// the dataset's last date.
pub fn month_range(start: YearMonth, end: YearMonth, dataset: &Dataset) -> (NaiveDate, NaiveDate) {
    let from = start.first_day();
    let to = end.last_day().min(dataset.last_date());
    (from, to)
}
