//! Field validation shared by add, edit and load.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::domain::{Expense, ExpenseDraft, ExpenseId, RawAmount, RawExpense};

/// A single field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Amount must be greater than 0")]
    InvalidAmount,
    #[error("Description is required")]
    MissingDescription,
    #[error("Category is required")]
    MissingCategory,
    #[error("Date is required")]
    MissingDate,
    #[error("Date is not a valid calendar date")]
    InvalidDate,
}

/// Why a transition left the state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("Invalid expense data: {}", join_issues(.0))]
    InvalidExpense(Vec<ValidationIssue>),
    #[error("Expense not found: {0}")]
    UnknownExpense(ExpenseId),
    #[error("Budget must be a non-negative number, got {0}")]
    InvalidBudget(f64),
}

impl Rejection {
    /// The failed fields, empty for rejections not caused by expense data.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Rejection::InvalidExpense(issues) => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Draft fields after parsing and checking.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidFields {
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

pub(crate) fn validate_draft(draft: &ExpenseDraft) -> Result<ValidFields, Vec<ValidationIssue>> {
    check_fields(
        parse_amount(&draft.amount),
        Some(&draft.description),
        Some(&draft.category),
        Some(&draft.date),
    )
    .map(|(amount, date)| ValidFields {
        amount,
        description: draft.description.clone(),
        category: draft.category.clone(),
        date,
        notes: normalize_notes(draft.notes.as_deref()),
    })
}

/// Validates a persisted record. Missing ids and timestamps are filled in
/// from `now`; present ones are kept.
pub(crate) fn validate_raw(
    raw: &RawExpense,
    now: DateTime<Utc>,
) -> Result<Expense, Vec<ValidationIssue>> {
    let amount = match &raw.amount {
        Some(RawAmount::Number(value)) => Some(*value),
        Some(RawAmount::Text(text)) => parse_amount(text),
        None => None,
    };
    let (amount, date) = check_fields(
        amount,
        raw.description.as_deref(),
        raw.category.as_deref(),
        raw.date.as_deref(),
    )?;

    let created_at = raw.created_at.as_deref().and_then(parse_date).unwrap_or(now);
    let updated_at = raw
        .updated_at
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(created_at);

    Ok(Expense {
        id: raw
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(ExpenseId::from)
            .unwrap_or_else(ExpenseId::generate),
        amount,
        description: raw.description.clone().unwrap_or_default(),
        category: raw.category.clone().unwrap_or_default(),
        date,
        notes: normalize_notes(raw.notes.as_deref()),
        created_at,
        updated_at,
    })
}

fn check_fields(
    amount: Option<f64>,
    description: Option<&str>,
    category: Option<&str>,
    date: Option<&str>,
) -> Result<(f64, DateTime<Utc>), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let amount = amount.filter(|value| value.is_finite() && *value > 0.0);
    if amount.is_none() {
        issues.push(ValidationIssue::InvalidAmount);
    }
    if description.map_or(true, |text| text.trim().is_empty()) {
        issues.push(ValidationIssue::MissingDescription);
    }
    if category.map_or(true, |id| id.trim().is_empty()) {
        issues.push(ValidationIssue::MissingCategory);
    }
    let date = match date.map(str::trim).filter(|text| !text.is_empty()) {
        None => {
            issues.push(ValidationIssue::MissingDate);
            None
        }
        Some(text) => {
            let parsed = parse_date(text);
            if parsed.is_none() {
                issues.push(ValidationIssue::InvalidDate);
            }
            parsed
        }
    };

    match (amount, date) {
        (Some(amount), Some(date)) if issues.is_empty() => Ok((amount, date)),
        _ => Err(issues),
    }
}

/// Parses a user-entered amount. Surrounding whitespace is ignored.
pub fn parse_amount(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok()
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` (read as UTC) and plain
/// `YYYY-MM-DD` dates, which are normalized to midnight UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(input) {
        return Some(stamp.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
