//! The transition function: `(state, action) -> next state`.
//!
//! Transitions are total. Invalid input never panics and never surfaces as an
//! `Err`; the caller receives the prior state together with a [`Rejection`],
//! and a warning is logged.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::core::action::Action;
use crate::core::state::AppState;
use crate::core::time::{Clock, SystemClock};
use crate::core::validation::{validate_draft, validate_raw, Rejection};
use crate::domain::{Category, Expense, ExpenseDraft, ExpenseId, RawExpense};

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(AppState),
    Rejected { state: AppState, reason: Rejection },
}

impl Transition {
    pub fn state(&self) -> &AppState {
        match self {
            Transition::Applied(state) | Transition::Rejected { state, .. } => state,
        }
    }

    pub fn into_state(self) -> AppState {
        match self {
            Transition::Applied(state) | Transition::Rejected { state, .. } => state,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Transition::Applied(_) => None,
            Transition::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Applies `action` using the system clock for ids and timestamps.
pub fn transition(state: &AppState, action: Action) -> Transition {
    transition_at(state, action, &SystemClock)
}

/// Applies `action`, reading "now" from `clock`.
pub fn transition_at(state: &AppState, action: Action, clock: &dyn Clock) -> Transition {
    let name = action.name();
    let result = match action {
        Action::AddExpense(draft) => add_expense(state, &draft, clock.now()),
        Action::DeleteExpense(id) => Ok(delete_expense(state, &id)),
        Action::EditExpense { id, changes } => edit_expense(state, &id, &changes, clock.now()),
        Action::LoadExpenses(records) => Ok(load_expenses(state, &records, clock.now())),
        Action::SetBudget(value) => set_budget(state, value),
        Action::UpdateCategories(categories) => Ok(state.with_categories(categories)),
        Action::LoadCategories(categories) => Ok(load_categories(state, categories)),
        Action::ClearAllData => Ok(state.cleared()),
    };

    match result {
        Ok(next) => Transition::Applied(next),
        Err(reason) => {
            warn!(action = name, %reason, "action rejected; state unchanged");
            Transition::Rejected {
                state: state.clone(),
                reason,
            }
        }
    }
}

fn add_expense(
    state: &AppState,
    draft: &ExpenseDraft,
    now: DateTime<Utc>,
) -> Result<AppState, Rejection> {
    let fields = validate_draft(draft).map_err(Rejection::InvalidExpense)?;
    let expense = Expense {
        id: ExpenseId::generate(),
        amount: fields.amount,
        description: fields.description,
        category: fields.category,
        date: fields.date,
        notes: fields.notes,
        created_at: now,
        updated_at: now,
    };

    let mut expenses = Vec::with_capacity(state.expenses().len() + 1);
    expenses.push(expense);
    expenses.extend(state.expenses().iter().cloned());
    Ok(state.with_expenses(expenses))
}

fn delete_expense(state: &AppState, id: &ExpenseId) -> AppState {
    if state.expense(id).is_none() {
        debug!(%id, "delete ignored; expense not present");
        return state.clone();
    }
    let expenses = state
        .expenses()
        .iter()
        .filter(|expense| &expense.id != id)
        .cloned()
        .collect();
    state.with_expenses(expenses)
}

fn edit_expense(
    state: &AppState,
    id: &ExpenseId,
    changes: &ExpenseDraft,
    now: DateTime<Utc>,
) -> Result<AppState, Rejection> {
    let fields = validate_draft(changes).map_err(Rejection::InvalidExpense)?;
    let position = state
        .expenses()
        .iter()
        .position(|expense| &expense.id == id)
        .ok_or_else(|| Rejection::UnknownExpense(id.clone()))?;

    let mut expenses = state.expenses().to_vec();
    let expense = &mut expenses[position];
    expense.amount = fields.amount;
    expense.description = fields.description;
    expense.category = fields.category;
    expense.date = fields.date;
    if changes.notes.is_some() {
        expense.notes = fields.notes;
    }
    expense.updated_at = next_update_stamp(expense.updated_at, now);
    Ok(state.with_expenses(expenses))
}

/// `updatedAt` must move strictly forward even when the clock has not.
fn next_update_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

fn load_expenses(state: &AppState, records: &[RawExpense], now: DateTime<Utc>) -> AppState {
    let expenses: Vec<Expense> = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match validate_raw(raw, now) {
            Ok(expense) => Some(expense),
            Err(issues) => {
                debug!(index, ?issues, "dropping invalid stored expense");
                None
            }
        })
        .collect();
    debug!(
        loaded = expenses.len(),
        dropped = records.len() - expenses.len(),
        "expenses loaded"
    );
    state.with_expenses(expenses)
}

fn set_budget(state: &AppState, value: f64) -> Result<AppState, Rejection> {
    if !value.is_finite() || value < 0.0 {
        return Err(Rejection::InvalidBudget(value));
    }
    Ok(state.with_budget(value))
}

fn load_categories(state: &AppState, categories: Vec<Category>) -> AppState {
    if categories.is_empty() {
        debug!("empty category load ignored; keeping current categories");
        return state.clone();
    }
    state.with_categories(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::DEFAULT_BUDGET;
    use crate::core::time::FixedClock;
    use crate::core::validation::ValidationIssue;
    use chrono::{NaiveDate, TimeZone};

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap())
    }

    fn draft(amount: f64, description: &str) -> ExpenseDraft {
        ExpenseDraft::new(
            amount,
            description,
            "1",
            NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
        )
    }

    #[test]
    fn add_prepends_and_stamps_both_timestamps() {
        let clock = clock();
        let state = transition_at(
            &AppState::default(),
            Action::AddExpense(draft(10.0, "First")),
            &clock,
        )
        .into_state();
        let next = transition_at(&state, Action::AddExpense(draft(20.0, "Second")), &clock);

        assert!(next.is_applied());
        let expenses = next.state().expenses();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description, "Second");
        assert_eq!(expenses[0].created_at, clock.now());
        assert_eq!(expenses[0].created_at, expenses[0].updated_at);
        assert_eq!(
            expenses[0].date,
            Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn add_shares_untouched_categories() {
        let state = AppState::default();
        let next = transition_at(&state, Action::AddExpense(draft(5.0, "Tea")), &clock());
        assert!(next.state().shares_categories_with(&state));
        assert!(!next.state().shares_expenses_with(&state));
    }

    #[test]
    fn rejected_add_reports_reason() {
        let state = AppState::default();
        let next = transition_at(&state, Action::AddExpense(draft(0.0, "")), &clock());
        assert_eq!(next.state(), &state);
        assert_eq!(
            next.rejection().map(Rejection::issues),
            Some(
                &[
                    ValidationIssue::InvalidAmount,
                    ValidationIssue::MissingDescription
                ][..]
            )
        );
    }

    #[test]
    fn edit_keeps_existing_notes_when_draft_has_none() {
        let clock = clock();
        let state = transition_at(
            &AppState::default(),
            Action::AddExpense(draft(10.0, "Dinner").with_notes("with friends")),
            &clock,
        )
        .into_state();
        let id = state.expenses()[0].id.clone();

        let next = transition_at(
            &state,
            Action::EditExpense {
                id: id.clone(),
                changes: draft(12.0, "Dinner out"),
            },
            &clock,
        );
        let edited = next.state().expense(&id).expect("edited expense");
        assert_eq!(edited.amount, 12.0);
        assert_eq!(edited.notes.as_deref(), Some("with friends"));
        assert!(edited.updated_at > edited.created_at);
    }

    #[test]
    fn edit_runs_the_same_validation_as_add() {
        let clock = clock();
        let state = transition_at(
            &AppState::default(),
            Action::AddExpense(draft(10.0, "Dinner")),
            &clock,
        )
        .into_state();
        let id = state.expenses()[0].id.clone();

        let next = transition_at(
            &state,
            Action::EditExpense {
                id,
                changes: draft(0.0, " "),
            },
            &clock,
        );
        assert!(!next.is_applied());
        assert_eq!(next.state(), &state);
        assert_eq!(
            next.rejection().map(Rejection::issues),
            Some(
                &[
                    ValidationIssue::InvalidAmount,
                    ValidationIssue::MissingDescription
                ][..]
            )
        );
    }

    #[test]
    fn edit_of_unknown_id_is_rejected() {
        let state = AppState::default();
        let missing = ExpenseId::from("missing");
        let next = transition_at(
            &state,
            Action::EditExpense {
                id: missing.clone(),
                changes: draft(1.0, "x"),
            },
            &clock(),
        );
        assert_eq!(next.rejection(), Some(&Rejection::UnknownExpense(missing)));
        assert_eq!(next.state(), &state);
    }

    #[test]
    fn budget_rejects_negative_and_non_finite_values() {
        let state = AppState::default();
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            let next = transition_at(&state, Action::SetBudget(value), &clock());
            assert!(!next.is_applied());
            assert_eq!(next.state().budget(), DEFAULT_BUDGET);
        }
        let zero = transition_at(&state, Action::SetBudget(0.0), &clock());
        assert_eq!(zero.state().budget(), 0.0);
        assert!(zero.state().shares_expenses_with(&state));
    }

    #[test]
    fn empty_category_load_keeps_current_list() {
        let state = AppState::default();
        let next = transition_at(&state, Action::LoadCategories(Vec::new()), &clock());
        assert!(next.is_applied());
        assert_eq!(next.state(), &state);

        let replaced = transition_at(
            &state,
            Action::UpdateCategories(Vec::new()),
            &clock(),
        );
        assert!(replaced.state().categories().is_empty());
    }

    #[test]
    fn update_timestamp_moves_forward_on_a_frozen_clock() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(next_update_stamp(at, at) > at);
        let later = at + Duration::seconds(5);
        assert_eq!(next_update_stamp(at, later), later);
    }
}
