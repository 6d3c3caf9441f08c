//! The application state aggregate owned by the state container.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{default_categories, Category, Expense, ExpenseId};

/// Monthly budget used on first run and after clearing all data.
pub const DEFAULT_BUDGET: f64 = 5000.0;

/// `{ expenses, budget, categories }`.
///
/// Values are never edited in place. Transitions build a new `AppState` and
/// hand over the untouched lists by cloning their `Arc`, so unchanged parts are
/// shared between the old and the new state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    expenses: Arc<Vec<Expense>>,
    budget: f64,
    categories: Arc<Vec<Category>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_BUDGET, default_categories())
    }
}

impl AppState {
    pub fn new(expenses: Vec<Expense>, budget: f64, categories: Vec<Category>) -> Self {
        Self {
            expenses: Arc::new(expenses),
            budget,
            categories: Arc::new(categories),
        }
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn expense(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|expense| &expense.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// True when both states hold the very same expense list allocation.
    pub fn shares_expenses_with(&self, other: &AppState) -> bool {
        Arc::ptr_eq(&self.expenses, &other.expenses)
    }

    /// True when both states hold the very same category list allocation.
    pub fn shares_categories_with(&self, other: &AppState) -> bool {
        Arc::ptr_eq(&self.categories, &other.categories)
    }

    pub(crate) fn with_expenses(&self, expenses: Vec<Expense>) -> Self {
        Self {
            expenses: Arc::new(expenses),
            budget: self.budget,
            categories: Arc::clone(&self.categories),
        }
    }

    pub(crate) fn with_budget(&self, budget: f64) -> Self {
        Self {
            expenses: Arc::clone(&self.expenses),
            budget,
            categories: Arc::clone(&self.categories),
        }
    }

    pub(crate) fn with_categories(&self, categories: Vec<Category>) -> Self {
        Self {
            expenses: Arc::clone(&self.expenses),
            budget: self.budget,
            categories: Arc::new(categories),
        }
    }

    /// Defaults for expenses and budget, keeping this state's categories.
    pub(crate) fn cleared(&self) -> Self {
        Self {
            expenses: Arc::new(Vec::new()),
            budget: DEFAULT_BUDGET,
            categories: Arc::clone(&self.categories),
        }
    }
}
