//! Read-only projections over expenses, categories and the budget.
//!
//! Selectors are pure: they never mutate their inputs, never cache, and
//! return results in a stable order for equal inputs. Anything relative to
//! "now" takes the reference instant as an argument.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Expense, UNCATEGORIZED_LABEL};

/// Number of entries the recent list shows when the caller has no preference.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Sum of `amount` over the collection.
pub fn total<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> f64 {
    expenses.into_iter().map(|expense| expense.amount).sum()
}

/// Expenses dated in the same calendar month and year (UTC) as `reference`.
pub fn monthly(expenses: &[Expense], reference: DateTime<Utc>) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|expense| same_month(expense.date, reference))
        .collect()
}

pub(crate) fn same_month(date: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
    date.year() == reference.year() && date.month() == reference.month()
}

/// Groups expenses by category id. Within a group the input order is kept.
pub fn by_category(expenses: &[Expense]) -> BTreeMap<&str, Vec<&Expense>> {
    let mut groups: BTreeMap<&str, Vec<&Expense>> = BTreeMap::new();
    for expense in expenses {
        groups
            .entry(expense.category.as_str())
            .or_default()
            .push(expense);
    }
    groups
}

/// Expenses dated within `[start, end]`, both ends inclusive.
pub fn in_date_range(
    expenses: &[Expense],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|expense| expense.date >= start && expense.date <= end)
        .collect()
}

/// Spending attributed to one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

/// One entry per category, in category order. Categories without matching
/// expenses report zero. Expenses pointing at unknown categories are not
/// counted anywhere.
pub fn category_totals<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    categories: &[Category],
) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = categories
        .iter()
        .map(|category| CategoryTotal {
            category: category.clone(),
            total: 0.0,
            count: 0,
        })
        .collect();

    for expense in expenses {
        if let Some(entry) = totals
            .iter_mut()
            .find(|entry| entry.category.id == expense.category)
        {
            entry.total += expense.amount;
            entry.count += 1;
        }
    }
    totals
}

/// Four-band classification of how much of the budget is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Safe,
    Moderate,
    Warning,
    Exceeded,
}

impl BudgetTier {
    /// Lower bounds are inclusive: 60 is moderate, 80 is warning, 100 is exceeded.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            BudgetTier::Exceeded
        } else if percentage >= 80.0 {
            BudgetTier::Warning
        } else if percentage >= 60.0 {
            BudgetTier::Moderate
        } else {
            BudgetTier::Safe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BudgetTier::Safe => "safe",
            BudgetTier::Moderate => "moderate",
            BudgetTier::Warning => "warning",
            BudgetTier::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub total_spent: f64,
    pub remaining: f64,
    pub percentage_spent: f64,
    pub status: BudgetTier,
    pub is_over_budget: bool,
}

/// Compares the spend of `expenses` against `budget`. A zero budget reports
/// 0 % spent rather than dividing by zero.
pub fn budget_status<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    budget: f64,
) -> BudgetStatus {
    let total_spent = total(expenses);
    let percentage_spent = if budget > 0.0 {
        total_spent * 100.0 / budget
    } else {
        0.0
    };
    BudgetStatus {
        total_spent,
        remaining: budget - total_spent,
        percentage_spent,
        status: BudgetTier::from_percentage(percentage_spent),
        is_over_budget: total_spent > budget,
    }
}

/// The `limit` most recently created expenses, newest first. Ties keep input order.
pub fn recent(expenses: &[Expense], limit: usize) -> Vec<&Expense> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

/// Category name for `id`, or "Uncategorized" for a dangling reference.
pub fn category_label<'a>(categories: &'a [Category], id: &str) -> &'a str {
    categories
        .iter()
        .find(|category| category.id == id)
        .map(|category| category.name.as_str())
        .unwrap_or(UNCATEGORIZED_LABEL)
}
