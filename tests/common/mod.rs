#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use expense_core::{
    config::ConfigManager,
    core::{Action, AppState, ExpenseManager, FixedClock},
    domain::ExpenseDraft,
    storage::JsonStorage,
    transition_at,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated managers backed by unique directories for each test.
pub fn setup_test_env(now: DateTime<Utc>) -> (ExpenseManager, ConfigManager, PathBuf) {
    let base = temp_base();
    let store = base.join("store");
    let storage = JsonStorage::new(Some(store.clone())).expect("create json storage backend");
    let manager = ExpenseManager::open(Box::new(storage), Box::new(FixedClock::new(now)))
        .expect("open expense manager");
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    (manager, config_manager, store)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn draft(amount: f64, description: &str, category: &str, date: NaiveDate) -> ExpenseDraft {
    ExpenseDraft::new(amount, description, category, date)
}

/// Applies `drafts` in order, advancing the clock a minute between each.
pub fn state_with(drafts: Vec<ExpenseDraft>, clock: &FixedClock) -> AppState {
    drafts.into_iter().fold(AppState::default(), |state, draft| {
        clock.advance(chrono::Duration::minutes(1));
        transition_at(&state, Action::AddExpense(draft), clock).into_state()
    })
}
