//! The expense state container: state, actions, the transition function and
//! the selectors computed over it.

pub mod action;
pub mod analytics;
pub mod expense_manager;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod time;
pub mod validation;

pub use action::Action;
pub use analytics::{AnalyticsReport, DashboardSummary, ExpenseQuery};
pub use expense_manager::{DispatchOutcome, ExpenseManager};
pub use reducer::{transition, transition_at, Transition};
pub use selectors::{BudgetStatus, BudgetTier, CategoryTotal};
pub use state::{AppState, DEFAULT_BUDGET};
pub use time::{Clock, FixedClock, SystemClock};
pub use validation::{Rejection, ValidationIssue};
