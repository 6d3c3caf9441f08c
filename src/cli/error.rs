use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::errors::ExpenseError;

/// Failure of a single shell command. The shell reports it and keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Core(#[from] ExpenseError),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Unknown command `{name}`{}", suggestion_hint(.suggestion))]
    UnknownCommand {
        name: String,
        suggestion: Option<&'static str>,
    },
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

fn suggestion_hint(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean `{name}`?)"),
        None => String::new(),
    }
}

/// Failure that ends the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ExpenseError),
    #[error("Line editor error: {0}")]
    Readline(#[from] ReadlineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
