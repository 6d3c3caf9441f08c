#![doc(test(attr(deny(warnings))))]

//! Expense Core holds the state of a personal expense tracker: a list of
//! expenses, a monthly budget and spending categories. Every change goes
//! through a single transition function, and read-only selectors derive the
//! totals, budget status and trends shown to the user.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

pub use crate::core::{transition, transition_at, Action, AppState, Transition};
pub use crate::errors::{ExpenseError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense Core tracing initialized.");
    });
}
