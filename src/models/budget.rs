use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
pub struct CategoryAmount {
    pub amount: f64,
    /// Share of `total_estimated`, 0.0 when the total is zero.
    pub percent: f64,
}

/// Categorized partition of the trip's estimated spend. Every cost
/// source maps to exactly one category, so the amounts sum to the
/// estimated total.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    pub transport: CategoryAmount,
    pub accommodation: CategoryAmount,
    pub activities: CategoryAmount,
    pub meals: CategoryAmount,
    pub other: CategoryAmount,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub amount: f64,
    pub over_limit: bool,
}

/// Derived view, recomputed on demand and never persisted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BudgetSummary {
    pub total_budget: f64,
    pub total_estimated: f64,
    pub breakdown: CategoryBreakdown,
    pub cost_per_day: f64,
    pub remaining: f64,
    pub over_budget: bool,
    pub duration_days: i64,
    pub daily_spend: Vec<DailySpend>,
}
