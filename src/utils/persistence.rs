//! Moves application state in and out of a [`StorageBackend`].
//!
//! State is kept under three keys: `expenses` (JSON array), `budget` (plain
//! number) and `categories` (JSON array). Loading replays the stored values
//! through the transition function, so the same validation applies to data
//! read from disk as to data typed by a user.

use std::{fmt, fs, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{transition_at, Action, AppState, Clock};
use crate::domain::{Category, RawExpense};
use crate::errors::{ExpenseError, Result};
use crate::storage::json_backend::{tmp_path, write_atomic};
use crate::storage::StorageBackend;

pub const EXPENSES_KEY: &str = "expenses";
pub const BUDGET_KEY: &str = "budget";
pub const CATEGORIES_KEY: &str = "categories";

/// Version tag written into settings exports.
pub const EXPORT_VERSION: &str = "1.0";

/// A stored key whose value could not be used. The key keeps its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProblem {
    pub key: &'static str,
    pub message: String,
}

impl fmt::Display for LoadProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.key, self.message)
    }
}

/// State read back from storage plus any keys that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    pub state: AppState,
    pub problems: Vec<LoadProblem>,
}

/// Builds the session state from storage, falling back to defaults for any
/// key that is absent or unreadable. Each key is handled on its own, so a
/// corrupt `categories` value does not cost the user their expenses.
/// Only backend failures (I/O) are errors.
pub fn load_state(backend: &dyn StorageBackend, clock: &dyn Clock) -> Result<LoadedState> {
    let mut state = AppState::default();
    let mut problems = Vec::new();

    if let Some(raw) = backend.read(EXPENSES_KEY)? {
        match parse_expenses(&raw) {
            Ok(records) => {
                state = transition_at(&state, Action::LoadExpenses(records), clock).into_state();
            }
            Err(message) => problems.push(LoadProblem {
                key: EXPENSES_KEY,
                message,
            }),
        }
    }

    if let Some(raw) = backend.read(BUDGET_KEY)? {
        match raw.trim().parse::<f64>() {
            Ok(budget) => {
                let result = transition_at(&state, Action::SetBudget(budget), clock);
                if let Some(reason) = result.rejection() {
                    problems.push(LoadProblem {
                        key: BUDGET_KEY,
                        message: reason.to_string(),
                    });
                }
                state = result.into_state();
            }
            Err(_) => problems.push(LoadProblem {
                key: BUDGET_KEY,
                message: format!("`{}` is not a number", raw.trim()),
            }),
        }
    }

    if let Some(raw) = backend.read(CATEGORIES_KEY)? {
        match serde_json::from_str::<Vec<Category>>(&raw) {
            Ok(categories) => {
                state =
                    transition_at(&state, Action::LoadCategories(categories), clock).into_state();
            }
            Err(err) => problems.push(LoadProblem {
                key: CATEGORIES_KEY,
                message: err.to_string(),
            }),
        }
    }

    for problem in &problems {
        warn!(key = problem.key, message = %problem.message, "stored value skipped");
    }
    info!(
        expenses = state.expenses().len(),
        categories = state.categories().len(),
        skipped = problems.len(),
        "state loaded"
    );
    Ok(LoadedState { state, problems })
}

/// Parses the stored expense array. Records that are not objects of the
/// expected shape are dropped here; field validation happens in the
/// transition.
fn parse_expenses(raw: &str) -> std::result::Result<Vec<RawExpense>, String> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|err| err.to_string())?;
    Ok(records
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(%err, "skipping unreadable stored expense");
                None
            }
        })
        .collect())
}

/// Writes all three keys.
pub fn save_state(backend: &dyn StorageBackend, state: &AppState) -> Result<()> {
    backend.write(EXPENSES_KEY, &serde_json::to_string(state.expenses())?)?;
    backend.write(BUDGET_KEY, &state.budget().to_string())?;
    backend.write(CATEGORIES_KEY, &serde_json::to_string(state.categories())?)?;
    debug!(expenses = state.expenses().len(), "state saved");
    Ok(())
}

/// Deletes every stored key. Returns how many were present.
pub fn erase_state(backend: &dyn StorageBackend) -> Result<usize> {
    let mut removed = 0;
    for key in [EXPENSES_KEY, BUDGET_KEY, CATEGORIES_KEY] {
        if backend.contains(key)? {
            backend.remove(key)?;
            removed += 1;
        }
    }
    info!(removed, "stored state erased");
    Ok(removed)
}

/// Budget and categories as downloaded from the settings page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsExport {
    pub budget: f64,
    pub categories: Vec<Category>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl SettingsExport {
    pub fn from_state(state: &AppState, exported_at: DateTime<Utc>) -> Self {
        Self {
            budget: state.budget(),
            categories: state.categories().to_vec(),
            export_date: exported_at,
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// `expense-tracker-settings-YYYY-MM-DD.json`
    pub fn file_name(date: NaiveDate) -> String {
        format!("expense-tracker-settings-{}.json", date.format("%Y-%m-%d"))
    }

    /// Actions that apply this export to a state.
    pub fn into_actions(self) -> [Action; 2] {
        [
            Action::SetBudget(self.budget),
            Action::UpdateCategories(self.categories),
        ]
    }
}

pub fn write_export(export: &SettingsExport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(export)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_export(path: &Path) -> Result<SettingsExport> {
    let data = fs::read_to_string(path)?;
    let export: SettingsExport = serde_json::from_str(&data)?;
    if export.version != EXPORT_VERSION {
        return Err(ExpenseError::InvalidInput(format!(
            "unsupported settings export version `{}`",
            export.version
        )));
    }
    Ok(export)
}
