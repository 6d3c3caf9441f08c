//! Pure domain models for the expense tracker.
//! No I/O and no CLI. Only data types and the traits they share.

pub mod category;
pub mod common;
pub mod expense;

pub use category::{default_categories, Category, UNCATEGORIZED_LABEL};
pub use common::{Amounted, BelongsToCategory, Displayable, Identifiable, NamedEntity};
pub use expense::{Expense, ExpenseDraft, ExpenseId, RawAmount, RawExpense};
