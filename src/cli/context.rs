use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::cli::commands::register_all;
use crate::cli::error::{CliError, CommandError};
use crate::cli::registry::CommandRegistry;
use crate::cli::{output, CommandResult};
use crate::config::{Config, ConfigManager};
use crate::core::{Action, DispatchOutcome, ExpenseManager, SystemClock};
use crate::domain::{ExpenseId, Identifiable, NamedEntity};
use crate::storage::JsonStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Everything a command handler can reach.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub manager: ExpenseManager,
    pub config: Config,
    config_manager: Option<ConfigManager>,
    pub theme: ColorfulTheme,
    pub running: bool,
}

impl ShellContext {
    /// Opens the on-disk store and config under the application data directory.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let storage = JsonStorage::new_default()?;
        let manager = ExpenseManager::open(Box::new(storage), Box::new(SystemClock))?;
        let config_manager = ConfigManager::new()?;
        let config = config_manager.load()?;
        for problem in manager.load_problems() {
            output::warning(format!("Error loading saved data {problem}; using defaults"));
        }
        if !manager.load_problems().is_empty() {
            output::info("Run `reset` to erase the stored data and start over.");
        }
        let mut context = Self::with_parts(mode, manager, config);
        context.config_manager = Some(config_manager);
        Ok(context)
    }

    /// A context whose config changes stay in memory.
    pub fn with_parts(mode: CliMode, manager: ExpenseManager, config: Config) -> Self {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        Self {
            mode,
            registry,
            manager,
            config,
            config_manager: None,
            theme: ColorfulTheme::default(),
            running: true,
        }
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn dispatch(&mut self, command: &str, args: &[&str]) -> CommandResult {
        let handler = match self.registry.get(command) {
            Some(entry) => entry.handler,
            None => {
                return Err(CommandError::UnknownCommand {
                    name: command.to_string(),
                    suggestion: self.registry.suggest(command),
                })
            }
        };
        handler(self, args)
    }

    /// Runs `action` and turns a rejection into a command error.
    pub fn apply(&mut self, action: Action) -> Result<(), CommandError> {
        match self.manager.dispatch(action)? {
            DispatchOutcome::Applied => Ok(()),
            DispatchOutcome::Rejected(reason) => Err(CommandError::Rejected(reason.to_string())),
        }
    }

    pub fn prompt(&self) -> String {
        let spent = self.manager.summary(1).budget.percentage_spent;
        let label = format!("expenses [{spent:.0}% of budget]> ");
        if self.config.dark_mode {
            label.bright_magenta().to_string()
        } else {
            label.bright_cyan().to_string()
        }
    }

    pub fn report_error(&self, err: CommandError) {
        output::error(err);
    }

    /// Script runs have nobody to ask, so they answer `yes`.
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        match self.mode {
            CliMode::Script => Ok(true),
            CliMode::Interactive => Confirm::with_theme(&self.theme)
                .with_prompt(prompt)
                .default(default)
                .interact()
                .map_err(CommandError::from),
        }
    }

    pub fn confirm_exit(&self) -> Result<bool, CliError> {
        match self.confirm("Exit the shell?", true) {
            Ok(answer) => Ok(answer),
            Err(err) => {
                output::warning(err);
                Ok(true)
            }
        }
    }

    pub fn save_config(&self) -> Result<(), CommandError> {
        self.config.validate()?;
        if let Some(manager) = &self.config_manager {
            manager.save(&self.config)?;
        }
        Ok(())
    }

    /// Accepts a full id or any unique prefix of one.
    pub fn resolve_expense(&self, input: &str) -> Result<ExpenseId, CommandError> {
        let needle = input.trim();
        if needle.is_empty() {
            return Err(CommandError::InvalidInput("expense id is empty".into()));
        }
        let exact = ExpenseId::from(needle);
        if self.manager.state().expense(&exact).is_some() {
            return Ok(exact);
        }
        let mut matches = self
            .manager
            .state()
            .expenses()
            .iter()
            .filter(|expense| expense.id.as_str().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(expense), None) => Ok(expense.id.clone()),
            (Some(_), Some(_)) => Err(CommandError::InvalidInput(format!(
                "`{needle}` matches more than one expense"
            ))),
            (None, _) => Err(CommandError::InvalidInput(format!(
                "no expense with id `{needle}`"
            ))),
        }
    }

    /// Accepts a category id or a case-insensitive category name.
    pub fn resolve_category(&self, input: &str) -> String {
        let state = self.manager.state();
        if state.category(input).is_some() {
            return input.to_string();
        }
        state
            .categories()
            .iter()
            .find(|category| category.name().eq_ignore_ascii_case(input.trim()))
            .map(|category| category.id().to_string())
            .unwrap_or_else(|| input.to_string())
    }
}
