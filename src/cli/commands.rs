use std::path::PathBuf;

use crate::cli::context::ShellContext;
use crate::cli::error::CommandError;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::cli::{help, output, CommandResult, LoopControl};
use crate::core::analytics::{DateFilter, SortKey, SortOrder};
use crate::core::selectors::{self, category_label};
use crate::core::{Action, ExpenseQuery};
use crate::domain::{
    Amounted, BelongsToCategory, Category, Displayable, Expense, ExpenseDraft, Identifiable,
};
use crate::utils::{ensure_dir, paths, persistence};

const ADD_USAGE: &str = "add <amount> <description> <category> [date] [notes]";
const EDIT_USAGE: &str =
    "edit <id> <amount|-> <description|-> <category|-> <date|-> [notes]  (`-` keeps the current value)";
const DELETE_USAGE: &str = "delete <id>";
const LIST_USAGE: &str =
    "list [search] [--category <id>] [--period all|today|week|month|year] [--sort date|amount|description|category] [--asc]";
const CATEGORY_ADD_USAGE: &str = "category-add <id> <name> [color] [icon]";
const CATEGORY_REMOVE_USAGE: &str = "category-remove <id>";
const IMPORT_USAGE: &str = "import <path>";
const THEME_USAGE: &str = "theme [light|dark]";

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in [
        CommandEntry::new("add", "Record a new expense", ADD_USAGE, cmd_add),
        CommandEntry::new("edit", "Replace the fields of an expense", EDIT_USAGE, cmd_edit),
        CommandEntry::new("delete", "Remove an expense", DELETE_USAGE, cmd_delete),
        CommandEntry::new("list", "Search, filter and sort expenses", LIST_USAGE, cmd_list),
        CommandEntry::new("recent", "Show the latest entries", "recent [count]", cmd_recent),
        CommandEntry::new("budget", "Show or set the monthly budget", "budget [amount]", cmd_budget),
        CommandEntry::new("status", "Dashboard summary for this month", "status", cmd_status),
        CommandEntry::new("categories", "Categories with this month's totals", "categories", cmd_categories),
        CommandEntry::new("category-add", "Add or replace a category", CATEGORY_ADD_USAGE, cmd_category_add),
        CommandEntry::new("category-remove", "Remove a category", CATEGORY_REMOVE_USAGE, cmd_category_remove),
        CommandEntry::new("analytics", "Trends, averages and top categories", "analytics", cmd_analytics),
        CommandEntry::new("export", "Write budget and categories to a file", "export [path]", cmd_export),
        CommandEntry::new("import", "Load budget and categories from an export", IMPORT_USAGE, cmd_import),
        CommandEntry::new("clear", "Delete all expenses and reset the budget", "clear", cmd_clear),
        CommandEntry::new("reset", "Erase stored data, categories included", "reset", cmd_reset),
        CommandEntry::new("theme", "Show or switch the colour theme", THEME_USAGE, cmd_theme),
        CommandEntry::new("help", "List commands or describe one", "help [command]", cmd_help),
        CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit),
    ] {
        registry.register(entry);
    }
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !(3..=5).contains(&args.len()) {
        return Err(CommandError::Usage(ADD_USAGE));
    }
    let date = match args.get(3) {
        Some(date) => (*date).to_string(),
        None => context.manager.now().format("%Y-%m-%d").to_string(),
    };
    let draft = build_draft(context, args[0], args[1], args[2], date, args.get(4));
    warn_on_unknown_category(context, &draft.category);
    context.apply(Action::AddExpense(draft))?;
    if let Some(expense) = context.manager.state().expenses().first() {
        output::success(format!(
            "Expense added: {} [{}]",
            expense.display_label(),
            short_id(expense)
        ));
    }
    Ok(LoopControl::Continue)
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !(5..=6).contains(&args.len()) {
        return Err(CommandError::Usage(EDIT_USAGE));
    }
    let id = context.resolve_expense(args[0])?;
    let Some(current) = context.manager.state().expense(&id) else {
        return Err(CommandError::InvalidInput(format!("no expense with id `{id}`")));
    };
    let mut draft = ExpenseDraft::from(current);
    if let Some(amount) = changed(args[1]) {
        draft.amount = amount.to_string();
    }
    if let Some(description) = changed(args[2]) {
        draft.description = description.to_string();
    }
    if let Some(category) = changed(args[3]) {
        draft.category = context.resolve_category(category);
    }
    if let Some(date) = changed(args[4]) {
        draft.date = date.to_string();
    }
    if let Some(notes) = args.get(5) {
        draft.notes = Some((*notes).to_string());
    }
    warn_on_unknown_category(context, &draft.category);
    context.apply(Action::EditExpense {
        id: id.clone(),
        changes: draft,
    })?;
    output::success(format!("Expense {id} updated"));
    Ok(LoopControl::Continue)
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [input] = args else {
        return Err(CommandError::Usage(DELETE_USAGE));
    };
    let id = context.resolve_expense(input)?;
    context.apply(Action::DeleteExpense(id.clone()))?;
    output::success(format!("Expense {id} deleted"));
    Ok(LoopControl::Continue)
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = parse_query(args)?;
    let state = context.manager.state();
    let matches = query.apply(state.expenses(), state.categories(), context.manager.now());
    output::section(format!("Expenses ({})", matches.len()));
    if matches.is_empty() {
        output::info("No expenses match the current filters.");
        return Ok(LoopControl::Continue);
    }
    for expense in &matches {
        output::info(expense_line(context, expense));
    }
    output::info(format!(
        "Total: {}",
        context.config.format_amount(selectors::total(matches.iter().copied()))
    ));
    Ok(LoopControl::Continue)
}

fn cmd_recent(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let limit = match args {
        [] => context.config.recent_limit,
        [count] => count
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidInput(format!("`{count}` is not a count")))?,
        _ => return Err(CommandError::Usage("recent [count]")),
    };
    output::section("Recent expenses");
    let recent = selectors::recent(context.manager.state().expenses(), limit);
    if recent.is_empty() {
        output::info("No expenses recorded yet.");
    }
    for expense in recent {
        output::info(expense_line(context, expense));
    }
    Ok(LoopControl::Continue)
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            output::info(format!(
                "Monthly budget: {}",
                context.config.format_amount(context.manager.state().budget())
            ));
        }
        [value] => {
            let amount = value
                .trim()
                .parse::<f64>()
                .map_err(|_| CommandError::InvalidInput(format!("`{value}` is not a number")))?;
            context.apply(Action::SetBudget(amount))?;
            output::success(format!(
                "Budget updated to {}",
                context.config.format_amount(amount)
            ));
        }
        _ => return Err(CommandError::Usage("budget [amount]")),
    }
    Ok(LoopControl::Continue)
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = context.manager.summary(context.config.recent_limit);
    let config = &context.config;
    output::section("Dashboard");
    output::info(format!("Total spent:      {}", config.format_amount(summary.total_spent)));
    output::info(format!("This month:       {}", config.format_amount(summary.monthly_total)));
    output::info(format!("Transactions:     {}", summary.expense_count));
    output::info(format!("Average expense:  {}", config.format_amount(summary.average_expense)));

    let budget = summary.budget;
    let line = format!(
        "Budget status:    {} ({:.1}% used)",
        budget.status, budget.percentage_spent
    );
    if budget.is_over_budget {
        output::warning(line);
        output::warning(format!(
            "Over by {}",
            config.format_amount(budget.remaining.abs())
        ));
    } else {
        output::info(line);
        output::info(format!("Remaining:        {}", config.format_amount(budget.remaining)));
    }
    Ok(LoopControl::Continue)
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let state = context.manager.state();
    let month = selectors::monthly(state.expenses(), context.manager.now());
    output::section("Categories (this month)");
    for entry in selectors::category_totals(month, state.categories()) {
        output::info(format!(
            "  {:<4} {:<24} {:>12}  {} item(s)",
            entry.category.id,
            entry.category.display_label(),
            context.config.format_amount(entry.total),
            entry.count
        ));
    }
    Ok(LoopControl::Continue)
}

fn cmd_category_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !(2..=4).contains(&args.len()) {
        return Err(CommandError::Usage(CATEGORY_ADD_USAGE));
    }
    let id = args[0].trim();
    let name = args[1].trim();
    if id.is_empty() || name.is_empty() {
        return Err(CommandError::InvalidInput(
            "category id and name are required".into(),
        ));
    }
    let category = Category::new(
        id,
        name,
        args.get(2).copied().unwrap_or("#64748b"),
        args.get(3).copied().unwrap_or(""),
    );
    let mut categories = context.manager.state().categories().to_vec();
    match categories.iter_mut().find(|existing| existing.id == id) {
        Some(existing) => *existing = category,
        None => categories.push(category),
    }
    context.apply(Action::UpdateCategories(categories))?;
    output::success(format!("Category `{name}` saved"));
    Ok(LoopControl::Continue)
}

fn cmd_category_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(CommandError::Usage(CATEGORY_REMOVE_USAGE));
    };
    let state = context.manager.state();
    if state.category(id).is_none() {
        return Err(CommandError::InvalidInput(format!("no category with id `{id}`")));
    }
    let orphaned = state
        .expenses()
        .iter()
        .filter(|expense| expense.category == *id)
        .count();
    let categories: Vec<Category> = state
        .categories()
        .iter()
        .filter(|category| category.id != *id)
        .cloned()
        .collect();
    context.apply(Action::UpdateCategories(categories))?;
    output::success(format!("Category `{id}` removed"));
    if orphaned > 0 {
        output::warning(format!(
            "{orphaned} expense(s) now show as Uncategorized"
        ));
    }
    Ok(LoopControl::Continue)
}

fn cmd_analytics(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let Some(report) = context.manager.analytics(context.config.trend_months) else {
        output::info("No expenses recorded yet.");
        return Ok(LoopControl::Continue);
    };
    let config = &context.config;

    output::section("Monthly trend");
    for point in &report.monthly_trend {
        output::info(format!(
            "  {} {}  {:>12}  {} item(s)",
            point.label,
            point.year,
            config.format_amount(point.total),
            point.count
        ));
    }
    if let Some(peak) = report.peak_month() {
        output::info(format!("Peak month: {} {}", peak.label, peak.year));
    }

    output::section("Top categories");
    for share in &report.top_categories {
        output::info(format!(
            "  {:<24} {:>12}  {:.1}%",
            share.category.display_label(),
            config.format_amount(share.total),
            share.share
        ));
    }

    output::section("Insights");
    output::info(format!("Total spent:      {}", config.format_amount(report.total_spent)));
    output::info(format!("This month:       {}", config.format_amount(report.current_month_total)));
    output::info(format!("Daily average:    {}", config.format_amount(report.daily_average)));
    output::info(format!("Typical expense:  {}", config.format_amount(report.average_expense)));
    output::info(format!(
        "Budget used:      {:.0}% ({})",
        report.budget.percentage_spent, report.budget.status
    ));
    output::info(format!(
        "Stay on budget:   {} per day",
        config.format_amount(report.suggested_daily_allowance)
    ));
    Ok(LoopControl::Continue)
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let export = context.manager.export_settings();
    let path = match args {
        [] => {
            let dir = paths::export_dir();
            ensure_dir(&dir)?;
            dir.join(persistence::SettingsExport::file_name(
                export.export_date.date_naive(),
            ))
        }
        [path] => PathBuf::from(path),
        _ => return Err(CommandError::Usage("export [path]")),
    };
    persistence::write_export(&export, &path)?;
    output::success(format!("Settings exported to {}", path.display()));
    Ok(LoopControl::Continue)
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(CommandError::Usage(IMPORT_USAGE));
    };
    let export = persistence::read_export(PathBuf::from(path).as_path())?;
    match context.manager.import_settings(export)? {
        crate::core::DispatchOutcome::Applied => {
            output::success(format!("Settings imported from {path}"))
        }
        crate::core::DispatchOutcome::Rejected(reason) => {
            return Err(CommandError::Rejected(reason.to_string()))
        }
    }
    Ok(LoopControl::Continue)
}

fn cmd_clear(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Delete every expense and reset the budget?", false)? {
        output::info("Nothing cleared.");
        return Ok(LoopControl::Continue);
    }
    context.apply(Action::ClearAllData)?;
    output::success("All expenses deleted; budget reset. Categories were kept.");
    Ok(LoopControl::Continue)
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Erase all stored data, including custom categories?", false)? {
        output::info("Nothing erased.");
        return Ok(LoopControl::Continue);
    }
    let removed = context.manager.reset()?;
    output::success(format!(
        "Stored data erased ({removed} key(s)); starting from defaults."
    ));
    Ok(LoopControl::Continue)
}

fn cmd_theme(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {}
        [choice] => {
            context.config.dark_mode = match choice.to_ascii_lowercase().as_str() {
                "dark" => true,
                "light" => false,
                _ => return Err(CommandError::Usage(THEME_USAGE)),
            };
            context.save_config()?;
        }
        _ => return Err(CommandError::Usage(THEME_USAGE)),
    }
    let theme = if context.config.dark_mode { "dark" } else { "light" };
    output::info(format!("Theme: {theme}"));
    Ok(LoopControl::Continue)
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        None => help::print_overview(&context.registry),
        Some(name) => match context.registry.get(&name.to_ascii_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => {
                return Err(CommandError::UnknownCommand {
                    name: (*name).to_string(),
                    suggestion: context.registry.suggest(name),
                })
            }
        },
    }
    Ok(LoopControl::Continue)
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info("Goodbye.");
    Ok(LoopControl::Exit)
}

fn build_draft(
    context: &ShellContext,
    amount: &str,
    description: &str,
    category: &str,
    date: String,
    notes: Option<&&str>,
) -> ExpenseDraft {
    ExpenseDraft {
        amount: amount.to_string(),
        description: description.to_string(),
        category: context.resolve_category(category),
        date,
        notes: notes.map(|text| (*text).to_string()),
    }
}

/// `None` for `-`, which keeps the field's current value.
fn changed(arg: &str) -> Option<&str> {
    (arg != "-").then_some(arg)
}

fn warn_on_unknown_category(context: &ShellContext, category: &str) {
    if !category.trim().is_empty() && context.manager.state().category(category).is_none() {
        output::warning(format!(
            "Category `{category}` does not exist; the expense will show as Uncategorized"
        ));
    }
}

fn parse_query(args: &[&str]) -> Result<ExpenseQuery, CommandError> {
    let mut query = ExpenseQuery::default();
    let mut search = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "--category" => {
                let value = iter.next().ok_or(CommandError::Usage(LIST_USAGE))?;
                query.category = Some((*value).to_string());
            }
            "--period" => {
                let value = iter.next().ok_or(CommandError::Usage(LIST_USAGE))?;
                query.period = DateFilter::parse(value).ok_or_else(|| {
                    CommandError::InvalidInput(format!("unknown period `{value}`"))
                })?;
            }
            "--sort" => {
                let value = iter.next().ok_or(CommandError::Usage(LIST_USAGE))?;
                query.sort = SortKey::parse(value).ok_or_else(|| {
                    CommandError::InvalidInput(format!("unknown sort key `{value}`"))
                })?;
            }
            "--asc" => query.order = SortOrder::Ascending,
            "--desc" => query.order = SortOrder::Descending,
            word => search.push(word),
        }
    }
    if !search.is_empty() {
        query.search = Some(search.join(" "));
    }
    Ok(query)
}

fn short_id(expense: &Expense) -> &str {
    let id = expense.id();
    id.get(..8).unwrap_or(id)
}

fn expense_line(context: &ShellContext, expense: &Expense) -> String {
    let mut line = format!(
        "  {:<8}  {}  {:>12}  {:<18} {}",
        short_id(expense),
        expense.date.format("%Y-%m-%d"),
        context.config.format_amount(expense.amount()),
        category_label(context.manager.state().categories(), expense.category_id()),
        expense.description
    );
    if let Some(notes) = &expense.notes {
        line.push_str(&format!(" ({notes})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::CliMode;
    use crate::config::Config;
    use crate::core::{AppState, ExpenseManager, FixedClock, DEFAULT_BUDGET};
    use chrono::{TimeZone, Utc};

    fn context() -> ShellContext {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 10, 5, 10, 0, 0).unwrap());
        let manager = ExpenseManager::new(AppState::default(), Box::new(clock));
        ShellContext::with_parts(CliMode::Script, manager, Config::default())
    }

    #[test]
    fn add_defaults_date_to_today_and_resolves_category_names() {
        let mut ctx = context();
        ctx.dispatch("add", &["120", "Groceries run", "shopping"])
            .expect("add succeeds");
        let expense = &ctx.manager.state().expenses()[0];
        assert_eq!(expense.category, "4");
        assert_eq!(expense.date.format("%Y-%m-%d").to_string(), "2025-10-05");
    }

    #[test]
    fn rejected_add_surfaces_reason() {
        let mut ctx = context();
        let err = ctx
            .dispatch("add", &["0", "Nothing", "1"])
            .expect_err("zero amount rejected");
        assert!(err.to_string().contains("Amount must be greater than 0"));
        assert!(ctx.manager.state().expenses().is_empty());
    }

    #[test]
    fn edit_and_delete_accept_id_prefixes() {
        let mut ctx = context();
        ctx.dispatch("add", &["10", "Bus", "2", "2025-10-01"]).unwrap();
        let id = ctx.manager.state().expenses()[0].id.to_string();
        let prefix = &id[..8];

        ctx.dispatch("edit", &[prefix, "12", "Bus pass", "2", "2025-10-01", "monthly"])
            .expect("edit succeeds");
        let edited = &ctx.manager.state().expenses()[0];
        assert_eq!(edited.amount, 12.0);
        assert_eq!(edited.notes.as_deref(), Some("monthly"));

        ctx.dispatch("delete", &[prefix]).expect("delete succeeds");
        assert!(ctx.manager.state().expenses().is_empty());
    }

    #[test]
    fn edit_dash_keeps_current_fields() {
        let mut ctx = context();
        ctx.dispatch("add", &["75", "Cinema", "3", "2025-10-02", "with friends"])
            .unwrap();
        let id = ctx.manager.state().expenses()[0].id.to_string();

        ctx.dispatch("edit", &[id.as_str(), "80", "-", "-", "-"]).expect("edit succeeds");
        let edited = &ctx.manager.state().expenses()[0];
        assert_eq!(edited.amount, 80.0);
        assert_eq!(edited.description, "Cinema");
        assert_eq!(edited.category, "3");
        assert_eq!(edited.date.format("%Y-%m-%d").to_string(), "2025-10-02");
        assert_eq!(edited.notes.as_deref(), Some("with friends"));
    }

    #[test]
    fn invalid_edit_leaves_the_expense_alone() {
        let mut ctx = context();
        ctx.dispatch("add", &["75", "Cinema", "3", "2025-10-02"]).unwrap();
        let before = ctx.manager.state().clone();
        let id = before.expenses()[0].id.to_string();

        let err = ctx
            .dispatch("edit", &[id.as_str(), "0", "-", "-", "-"])
            .expect_err("zero amount rejected");
        assert!(matches!(err, CommandError::Rejected(_)));
        assert_eq!(ctx.manager.state(), &before);
    }

    #[test]
    fn reset_restores_default_categories() {
        let mut ctx = context();
        ctx.dispatch("category-add", &["pets", "Pets"]).unwrap();
        ctx.dispatch("add", &["30", "Food", "pets"]).unwrap();
        ctx.dispatch("reset", &[]).expect("reset succeeds");
        assert_eq!(ctx.manager.state(), &AppState::default());
    }

    #[test]
    fn clear_keeps_custom_categories() {
        let mut ctx = context();
        ctx.dispatch("category-add", &["pets", "Pets"]).unwrap();
        ctx.dispatch("budget", &["900"]).unwrap();
        ctx.dispatch("add", &["30", "Food", "pets"]).unwrap();
        ctx.dispatch("clear", &[]).unwrap();

        let state = ctx.manager.state();
        assert!(state.expenses().is_empty());
        assert_eq!(state.budget(), DEFAULT_BUDGET);
        assert!(state.category("pets").is_some());
    }

    #[test]
    fn unknown_commands_get_suggestions() {
        let mut ctx = context();
        let err = ctx.dispatch("lsit", &[]).expect_err("unknown command");
        assert!(matches!(
            err,
            CommandError::UnknownCommand {
                suggestion: Some("list"),
                ..
            }
        ));
    }

    #[test]
    fn list_flags_build_a_query() {
        let query = parse_query(&["--period", "month", "coffee", "--sort", "amount", "--asc", "beans"])
            .expect("valid flags");
        assert_eq!(query.period, DateFilter::Month);
        assert_eq!(query.sort, SortKey::Amount);
        assert_eq!(query.order, SortOrder::Ascending);
        assert_eq!(query.search.as_deref(), Some("coffee beans"));
        assert!(parse_query(&["--period", "decade"]).is_err());
        assert!(parse_query(&["--sort"]).is_err());
    }

    #[test]
    fn theme_switch_updates_config() {
        let mut ctx = context();
        ctx.dispatch("theme", &["dark"]).unwrap();
        assert!(ctx.config.dark_mode);
        assert!(ctx.dispatch("theme", &["blue"]).is_err());
    }

    #[test]
    fn exit_stops_the_loop() {
        let mut ctx = context();
        assert!(matches!(ctx.dispatch("exit", &[]), Ok(LoopControl::Exit)));
    }
}
