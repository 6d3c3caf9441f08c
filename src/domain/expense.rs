//! Domain types representing recorded expenses.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// Opaque expense identifier. Generated ids are UUIDs, but ids read back from
/// storage are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExpenseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single validated spending record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for Expense {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl BelongsToCategory for Expense {
    fn category_id(&self) -> &str {
        &self.category
    }
}

impl Amounted for Expense {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        format!(
            "{} ({:.2} on {})",
            self.description,
            self.amount,
            self.date.format("%Y-%m-%d")
        )
    }
}

/// Raw expense fields as entered by a user. Nothing here is trusted until it
/// passes validation in the transition function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub amount: String,
    pub description: String,
    pub category: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExpenseDraft {
    pub fn new(
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            amount: amount.to_string(),
            description: description.into(),
            category: category.into(),
            date: date.format("%Y-%m-%d").to_string(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl From<&Expense> for ExpenseDraft {
    fn from(expense: &Expense) -> Self {
        Self {
            amount: expense.amount.to_string(),
            description: expense.description.clone(),
            category: expense.category.clone(),
            date: expense.date.to_rfc3339(),
            notes: expense.notes.clone(),
        }
    }
}

/// Amount as found in persisted data: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

/// An expense record read back from storage, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExpense {
    pub id: Option<String>,
    pub amount: Option<RawAmount>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&Expense> for RawExpense {
    fn from(expense: &Expense) -> Self {
        Self {
            id: Some(expense.id.to_string()),
            amount: Some(RawAmount::Number(expense.amount)),
            description: Some(expense.description.clone()),
            category: Some(expense.category.clone()),
            date: Some(expense.date.to_rfc3339()),
            notes: expense.notes.clone(),
            created_at: Some(expense.created_at.to_rfc3339()),
            updated_at: Some(expense.updated_at.to_rfc3339()),
        }
    }
}
