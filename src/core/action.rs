use crate::domain::{Category, ExpenseDraft, ExpenseId, RawExpense};

/// Every way application state can change. The set is closed, so the
/// transition function matches it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddExpense(ExpenseDraft),
    DeleteExpense(ExpenseId),
    EditExpense { id: ExpenseId, changes: ExpenseDraft },
    LoadExpenses(Vec<RawExpense>),
    SetBudget(f64),
    UpdateCategories(Vec<Category>),
    LoadCategories(Vec<Category>),
    ClearAllData,
}

impl Action {
    /// Stable name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddExpense(_) => "add_expense",
            Action::DeleteExpense(_) => "delete_expense",
            Action::EditExpense { .. } => "edit_expense",
            Action::LoadExpenses(_) => "load_expenses",
            Action::SetBudget(_) => "set_budget",
            Action::UpdateCategories(_) => "update_categories",
            Action::LoadCategories(_) => "load_categories",
            Action::ClearAllData => "clear_all_data",
        }
    }
}
