//! Line-oriented shell over [`crate::core::ExpenseManager`].

pub mod commands;
pub mod context;
pub mod error;
pub mod help;
pub mod output;
pub mod registry;
mod shell;

pub use context::{CliMode, ShellContext};
pub use error::{CliError, CommandError};
pub use shell::{run_cli, SCRIPT_ENV};

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<LoopControl, CommandError>;
