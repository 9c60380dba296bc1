//! Balance trend and projection
//!
//! Builds the daily balance series from a view and extends it:
//! - Least-squares line over a trailing window, sampled at a fixed step
//! - Historical daily/monthly rate across the whole series
//! - Days until a target balance is reached at a given monthly rate

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::FilteredView;
use crate::models::{BalanceOutlook, TargetOutcome, TrendPoint, TrendReport};

/// Days per month used for rate conversions
pub const DAYS_PER_MONTH: f64 = 30.0;

/// How the forward projection is computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Trailing window (in days, ending at the last known date) used for the fit
    pub window_days: i64,
    /// Number of projected points
    pub points: usize,
    /// Days between projected points
    pub step_days: i64,
}

impl ProjectionConfig {
    pub fn new() -> Self {
        Self {
            window_days: 90,
            points: 3,
            step_days: 30,
        }
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    pub fn with_step_days(mut self, days: i64) -> Self {
        self.step_days = days;
        self
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Last balance per date, in date order
pub fn balance_series(view: &FilteredView<'_>) -> Vec<TrendPoint> {
    let mut series: Vec<TrendPoint> = Vec::new();

    for tx in view.iter() {
        match series.last_mut() {
            Some(point) if point.date == tx.date => point.balance = tx.balance,
            _ => series.push(TrendPoint {
                date: tx.date,
                balance: tx.balance,
            }),
        }
    }

    series
}

/// Fit a line over the trailing window and extend it forward
///
/// Fewer than two known points yields an empty projection.
pub fn project(series: &[TrendPoint], config: &ProjectionConfig) -> TrendReport {
    let history = series.to_vec();

    let last = match series.last() {
        Some(last) if series.len() >= 2 => *last,
        _ => {
            return TrendReport {
                history,
                projection: Vec::new(),
                slope_per_day: None,
            }
        }
    };

    let cutoff = Duration::try_days(config.window_days.max(0))
        .and_then(|window| last.date.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);
    let mut window: &[TrendPoint] = match series.iter().position(|p| p.date >= cutoff) {
        Some(start) => &series[start..],
        None => &series[series.len() - 2..],
    };
    if window.len() < 2 {
        window = &series[series.len() - 2..];
    }

    let (slope, intercept) = least_squares(window);
    let origin = window[0].date;
    let last_x = (last.date - origin).num_days() as f64;
    let step = config.step_days.max(1);

    // Stops early rather than overflowing the calendar
    let projection = (1..=config.points)
        .map_while(|k| {
            let offset = step.checked_mul(i64::try_from(k).ok()?)?;
            let date = last.date.checked_add_signed(Duration::try_days(offset)?)?;
            Some(TrendPoint {
                date,
                balance: intercept + slope * (last_x + offset as f64),
            })
        })
        .collect();

    TrendReport {
        history,
        projection,
        slope_per_day: Some(slope),
    }
}

/// Ordinary least squares of balance against days since the first point
///
/// Returns (slope per day, balance at day 0).
fn least_squares(points: &[TrendPoint]) -> (f64, f64) {
    let origin = points[0].date;
    let xs: Vec<f64> = points
        .iter()
        .map(|p| (p.date - origin).num_days() as f64)
        .collect();
    let n = points.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.balance).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, p) in xs.iter().zip(points) {
        covariance += (x - mean_x) * (p.balance - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }

    if variance == 0.0 {
        return (0.0, mean_y);
    }

    // Two points: use the endpoint slope directly so it is exact
    let slope = if points.len() == 2 {
        (points[1].balance - points[0].balance) / xs[1]
    } else {
        covariance / variance
    };
    (slope, mean_y - slope * mean_x)
}

/// Historical balance movement across the whole series
pub fn outlook(series: &[TrendPoint]) -> Option<BalanceOutlook> {
    let first = series.first()?;
    let last = series.last()?;

    let days_in_data = (last.date - first.date).num_days() + 1;
    let daily_rate = (last.balance - first.balance) / days_in_data as f64;

    Some(BalanceOutlook {
        current_balance: last.balance,
        first_date: first.date,
        last_date: last.date,
        days_in_data,
        daily_rate,
        monthly_rate: daily_rate * DAYS_PER_MONTH,
    })
}

/// When a target balance is reached at a constant monthly rate, counting from `from`
///
/// Non-finite inputs never reach anything.
pub fn days_to_target(
    current: f64,
    target: f64,
    monthly_rate: f64,
    from: NaiveDate,
) -> TargetOutcome {
    if !(current.is_finite() && target.is_finite() && monthly_rate.is_finite()) {
        return TargetOutcome::Never;
    }
    if target == current {
        return TargetOutcome::AlreadyReached;
    }
    if monthly_rate == 0.0 {
        return TargetOutcome::Never;
    }

    let needs_increase = target > current;
    let increasing = monthly_rate > 0.0;
    if needs_increase != increasing {
        return TargetOutcome::Never;
    }

    let daily = monthly_rate.abs() / DAYS_PER_MONTH;
    let days = ((target - current).abs() / daily).floor() as i64;

    match Duration::try_days(days).and_then(|d| from.checked_add_signed(d)) {
        Some(date) => TargetOutcome::Reached { days, date },
        None => TargetOutcome::Never,
    }
}
