//! Dashboard and analytics views built on top of the selectors.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::core::selectors::{self, BudgetStatus, CategoryTotal};
use crate::core::state::AppState;
use crate::domain::{Category, Expense};

/// Months shown by the spending trend unless configured otherwise.
pub const DEFAULT_TREND_MONTHS: u32 = 6;
/// Entries shown in the top-categories breakdown.
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrendPoint {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub total: f64,
    pub count: usize,
}

/// Totals for the `months` calendar months ending with the reference month,
/// oldest first.
pub fn monthly_trend(
    expenses: &[Expense],
    reference: DateTime<Utc>,
    months: u32,
) -> Vec<MonthlyTrendPoint> {
    (0..months)
        .rev()
        .map(|back| {
            let (year, month) = shift_month(reference.year(), reference.month(), back);
            let matching: Vec<&Expense> = expenses
                .iter()
                .filter(|expense| expense.date.year() == year && expense.date.month() == month)
                .collect();
            MonthlyTrendPoint {
                year,
                month,
                label: month_label(year, month),
                total: selectors::total(matching.iter().copied()),
                count: matching.len(),
            }
        })
        .collect()
}

fn shift_month(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%b").to_string())
        .unwrap_or_default()
}

/// The month with the highest total; the earliest one wins a tie.
pub fn peak_month(trend: &[MonthlyTrendPoint]) -> Option<&MonthlyTrendPoint> {
    trend.iter().fold(None, |peak, point| match peak {
        Some(best) if best.total >= point.total => Some(best),
        _ => Some(point),
    })
}

/// Total spend divided by the whole days since the oldest expense, counting
/// at least one day.
pub fn daily_average(expenses: &[Expense], reference: DateTime<Utc>) -> f64 {
    let Some(oldest) = expenses.iter().map(|expense| expense.date).min() else {
        return 0.0;
    };
    let seconds = (reference - oldest).num_seconds();
    let days = (seconds as f64 / Duration::days(1).num_seconds() as f64).ceil();
    selectors::total(expenses) / days.max(1.0)
}

pub fn average_expense(expenses: &[Expense]) -> f64 {
    if expenses.is_empty() {
        0.0
    } else {
        selectors::total(expenses) / expenses.len() as f64
    }
}

/// Spending per day that keeps a 30-day month within `budget`.
pub fn suggested_daily_allowance(budget: f64) -> f64 {
    budget / 30.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub total: f64,
    pub count: usize,
    /// Percentage of the overall spend of the same expense set.
    pub share: f64,
}

/// Categories with any spend, largest first, capped at `limit`.
pub fn top_categories(
    expenses: &[Expense],
    categories: &[Category],
    limit: usize,
) -> Vec<CategoryShare> {
    let overall = selectors::total(expenses);
    let mut ranked: Vec<CategoryTotal> = selectors::category_totals(expenses, categories)
        .into_iter()
        .filter(|entry| entry.total > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked
        .into_iter()
        .take(limit)
        .map(|entry| CategoryShare {
            share: if overall > 0.0 {
                entry.total * 100.0 / overall
            } else {
                0.0
            },
            category: entry.category,
            total: entry.total,
            count: entry.count,
        })
        .collect()
}

/// Figures for the landing view, computed against one reference instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_spent: f64,
    pub monthly_total: f64,
    pub expense_count: usize,
    pub average_expense: f64,
    pub budget: BudgetStatus,
    pub recent: Vec<Expense>,
}

impl DashboardSummary {
    pub fn compute(state: &AppState, reference: DateTime<Utc>, recent_limit: usize) -> Self {
        let expenses = state.expenses();
        let month = selectors::monthly(expenses, reference);
        Self {
            total_spent: selectors::total(expenses),
            monthly_total: selectors::total(month.iter().copied()),
            expense_count: expenses.len(),
            average_expense: average_expense(expenses),
            budget: selectors::budget_status(month, state.budget()),
            recent: selectors::recent(expenses, recent_limit)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

/// The analytics page: trend, averages, and the current month's budget use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub monthly_trend: Vec<MonthlyTrendPoint>,
    pub top_categories: Vec<CategoryShare>,
    pub total_spent: f64,
    pub current_month_total: f64,
    pub daily_average: f64,
    pub expense_count: usize,
    pub average_expense: f64,
    pub budget: BudgetStatus,
    pub suggested_daily_allowance: f64,
}

impl AnalyticsReport {
    /// `None` when there is nothing to analyse.
    pub fn compute(state: &AppState, reference: DateTime<Utc>, trend_months: u32) -> Option<Self> {
        let expenses = state.expenses();
        if expenses.is_empty() {
            return None;
        }
        let month = selectors::monthly(expenses, reference);
        Some(Self {
            monthly_trend: monthly_trend(expenses, reference, trend_months),
            top_categories: top_categories(expenses, state.categories(), DEFAULT_TOP_CATEGORIES),
            total_spent: selectors::total(expenses),
            current_month_total: selectors::total(month.iter().copied()),
            daily_average: daily_average(expenses, reference),
            expense_count: expenses.len(),
            average_expense: average_expense(expenses),
            budget: selectors::budget_status(month, state.budget()),
            suggested_daily_allowance: suggested_daily_allowance(state.budget()),
        })
    }

    pub fn peak_month(&self) -> Option<&MonthlyTrendPoint> {
        peak_month(&self.monthly_trend)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    /// The seven days before the reference instant.
    Week,
    Month,
    Year,
}

impl DateFilter {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "all" => Some(DateFilter::All),
            "today" => Some(DateFilter::Today),
            "week" => Some(DateFilter::Week),
            "month" => Some(DateFilter::Month),
            "year" => Some(DateFilter::Year),
            _ => None,
        }
    }

    fn matches(self, date: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::Today => date.date_naive() == reference.date_naive(),
            DateFilter::Week => date >= reference - Duration::days(7),
            DateFilter::Month => selectors::same_month(date, reference),
            DateFilter::Year => date.year() == reference.year(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
    Amount,
    Description,
    Category,
}

impl SortKey {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "date" => Some(SortKey::Date),
            "amount" => Some(SortKey::Amount),
            "description" => Some(SortKey::Description),
            "category" => Some(SortKey::Category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Search, filter and sort settings for the expense list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseQuery {
    /// Case-insensitive match against description or notes.
    pub search: Option<String>,
    pub category: Option<String>,
    pub period: DateFilter,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl ExpenseQuery {
    pub fn apply<'a>(
        &self,
        expenses: &'a [Expense],
        categories: &[Category],
        reference: DateTime<Utc>,
    ) -> Vec<&'a Expense> {
        let needle = self
            .search
            .as_deref()
            .map(|text| text.trim().to_lowercase())
            .filter(|text| !text.is_empty());

        let mut matches: Vec<&Expense> = expenses
            .iter()
            .filter(|expense| {
                needle.as_deref().map_or(true, |needle| {
                    expense.description.to_lowercase().contains(needle)
                        || expense
                            .notes
                            .as_deref()
                            .is_some_and(|notes| notes.to_lowercase().contains(needle))
                })
            })
            .filter(|expense| {
                self.category
                    .as_deref()
                    .map_or(true, |id| expense.category == id)
            })
            .filter(|expense| self.period.matches(expense.date, reference))
            .collect();

        matches.sort_by(|a, b| {
            let ordering = self.compare(a, b, categories);
            match self.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        matches
    }

    fn compare(&self, a: &Expense, b: &Expense, categories: &[Category]) -> Ordering {
        match self.sort {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::Description => a
                .description
                .to_lowercase()
                .cmp(&b.description.to_lowercase()),
            SortKey::Category => {
                let left = category_sort_name(categories, &a.category);
                let right = category_sort_name(categories, &b.category);
                left.to_lowercase().cmp(&right.to_lowercase())
            }
        }
    }
}

/// Dangling references sort as an empty name, ahead of every real category.
fn category_sort_name<'a>(categories: &'a [Category], id: &str) -> &'a str {
    categories
        .iter()
        .find(|category| category.id == id)
        .map(|category| category.name.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{default_categories, ExpenseId};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn expense(amount: f64, category: &str, date: DateTime<Utc>, description: &str) -> Expense {
        Expense {
            id: ExpenseId::generate(),
            amount,
            description: description.into(),
            category: category.into(),
            date,
            notes: None,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn trend_walks_back_across_year_boundary() {
        let expenses = vec![
            expense(100.0, "1", at(2024, 11, 5), "a"),
            expense(50.0, "1", at(2025, 2, 1), "b"),
            expense(25.0, "1", at(2025, 2, 20), "c"),
        ];
        let trend = monthly_trend(&expenses, at(2025, 2, 25), 6);
        let months: Vec<(i32, u32)> = trend.iter().map(|p| (p.year, p.month)).collect();
        assert_eq!(
            months,
            vec![(2024, 9), (2024, 10), (2024, 11), (2024, 12), (2025, 1), (2025, 2)]
        );
        assert_eq!(trend[2].total, 100.0);
        assert_eq!(trend[5].count, 2);
        assert_eq!(trend[5].label, "Feb");
        assert_eq!(peak_month(&trend).map(|p| p.month), Some(11));
    }

    #[test]
    fn daily_average_counts_at_least_one_day() {
        let expenses = vec![expense(90.0, "1", at(2025, 1, 1), "a")];
        assert_eq!(daily_average(&expenses, at(2025, 1, 1)), 90.0);
        assert_eq!(daily_average(&expenses, at(2025, 1, 10)), 10.0);
        assert_eq!(daily_average(&[], at(2025, 1, 10)), 0.0);
    }

    #[test]
    fn top_categories_skip_empty_and_report_share() {
        let categories = default_categories();
        let expenses = vec![
            expense(30.0, "1", at(2025, 1, 1), "a"),
            expense(10.0, "2", at(2025, 1, 2), "b"),
            expense(60.0, "1", at(2025, 1, 3), "c"),
        ];
        let top = top_categories(&expenses, &categories, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].category.id, "1");
        assert_eq!(top[0].share, 90.0);
        assert_eq!(top[1].count, 1);
    }

    #[test]
    fn query_filters_and_sorts() {
        let categories = default_categories();
        let mut coffee = expense(4.0, "1", at(2025, 3, 9), "Coffee");
        coffee.notes = Some("Oat latte".into());
        let expenses = vec![
            coffee,
            expense(40.0, "2", at(2025, 3, 1), "Train"),
            expense(12.0, "1", at(2025, 2, 1), "Lunch"),
        ];
        let reference = at(2025, 3, 10);

        let query = ExpenseQuery {
            search: Some("LATTE".into()),
            ..ExpenseQuery::default()
        };
        assert_eq!(query.apply(&expenses, &categories, reference).len(), 1);

        let query = ExpenseQuery {
            period: DateFilter::Month,
            sort: SortKey::Amount,
            order: SortOrder::Ascending,
            ..ExpenseQuery::default()
        };
        let amounts: Vec<f64> = query
            .apply(&expenses, &categories, reference)
            .iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(amounts, vec![4.0, 40.0]);

        let query = ExpenseQuery {
            category: Some("1".into()),
            ..ExpenseQuery::default()
        };
        let newest_first: Vec<&str> = query
            .apply(&expenses, &categories, reference)
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(newest_first, vec!["Coffee", "Lunch"]);
    }

    #[test]
    fn analytics_report_is_absent_without_expenses() {
        assert!(AnalyticsReport::compute(&AppState::default(), at(2025, 1, 1), 6).is_none());
    }
}
