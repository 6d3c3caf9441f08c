use chrono::{DateTime, Utc};
use tracing::info;

use crate::core::action::Action;
use crate::core::analytics::{AnalyticsReport, DashboardSummary};
use crate::core::reducer::{transition_at, Transition};
use crate::core::state::AppState;
use crate::core::time::{Clock, SystemClock};
use crate::core::validation::Rejection;
use crate::errors::Result;
use crate::storage::StorageBackend;
use crate::utils::persistence::{erase_state, load_state, save_state, LoadProblem, SettingsExport};

/// What happened to a dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Applied,
    Rejected(Rejection),
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied)
    }
}

/// Owns the session state and writes it back to storage after every
/// applied change.
pub struct ExpenseManager {
    state: AppState,
    storage: Option<Box<dyn StorageBackend>>,
    clock: Box<dyn Clock>,
    load_problems: Vec<LoadProblem>,
}

impl ExpenseManager {
    /// A manager without persistence.
    pub fn new(state: AppState, clock: Box<dyn Clock>) -> Self {
        Self {
            state,
            storage: None,
            clock,
            load_problems: Vec::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(AppState::default(), Box::new(SystemClock))
    }

    /// Loads state from `storage` and keeps it attached for writes. Stored
    /// keys that could not be used are available from [`Self::load_problems`].
    pub fn open(storage: Box<dyn StorageBackend>, clock: Box<dyn Clock>) -> Result<Self> {
        let loaded = load_state(storage.as_ref(), clock.as_ref())?;
        Ok(Self {
            state: loaded.state,
            storage: Some(storage),
            clock,
            load_problems: loaded.problems,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn load_problems(&self) -> &[LoadProblem] {
        &self.load_problems
    }

    /// Runs `action` through the transition function. Rejections are an
    /// `Ok` outcome; only persistence failures are errors.
    pub fn dispatch(&mut self, action: Action) -> Result<DispatchOutcome> {
        match transition_at(&self.state, action, self.clock.as_ref()) {
            Transition::Applied(next) => {
                let changed = next != self.state;
                self.state = next;
                if changed {
                    self.persist()?;
                }
                Ok(DispatchOutcome::Applied)
            }
            Transition::Rejected { reason, .. } => Ok(DispatchOutcome::Rejected(reason)),
        }
    }

    /// Writes the current state to the attached storage, if any.
    pub fn persist(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            save_state(storage.as_ref(), &self.state)?;
        }
        Ok(())
    }

    /// Erases every stored key and starts over from the default state,
    /// categories included. Returns how many keys were removed.
    pub fn reset(&mut self) -> Result<usize> {
        let removed = match &self.storage {
            Some(storage) => erase_state(storage.as_ref())?,
            None => 0,
        };
        self.state = AppState::default();
        self.load_problems.clear();
        Ok(removed)
    }

    /// Dashboard figures, all computed against a single clock reading.
    pub fn summary(&self, recent_limit: usize) -> DashboardSummary {
        DashboardSummary::compute(&self.state, self.now(), recent_limit)
    }

    pub fn analytics(&self, trend_months: u32) -> Option<AnalyticsReport> {
        AnalyticsReport::compute(&self.state, self.now(), trend_months)
    }

    pub fn export_settings(&self) -> SettingsExport {
        SettingsExport::from_state(&self.state, self.now())
    }

    /// Applies an export's budget and categories. Stops at the first rejection.
    pub fn import_settings(&mut self, export: SettingsExport) -> Result<DispatchOutcome> {
        for action in export.into_actions() {
            let outcome = self.dispatch(action)?;
            if !outcome.is_applied() {
                return Ok(outcome);
            }
        }
        info!(
            budget = self.state.budget(),
            categories = self.state.categories().len(),
            "settings imported"
        );
        Ok(DispatchOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::domain::{Category, ExpenseDraft};
    use crate::storage::MemoryStorage;
    use crate::utils::persistence::{BUDGET_KEY, CATEGORIES_KEY, EXPENSES_KEY};
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Arc;

    struct SharedStore(Arc<MemoryStorage>);

    impl StorageBackend for SharedStore {
        fn read(&self, key: &str) -> Result<Option<String>> {
            self.0.read(key)
        }
        fn write(&self, key: &str, value: &str) -> Result<()> {
            self.0.write(key, value)
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
    }

    fn clock() -> Box<FixedClock> {
        Box::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn applied_actions_are_written_through() {
        let store = Arc::new(MemoryStorage::new());
        let mut manager =
            ExpenseManager::open(Box::new(SharedStore(Arc::clone(&store))), clock()).unwrap();
        assert!(store.read(EXPENSES_KEY).unwrap().is_none());

        let outcome = manager
            .dispatch(Action::AddExpense(ExpenseDraft::new(
                18.0,
                "Cinema",
                "3",
                NaiveDate::from_ymd_opt(2025, 9, 9).unwrap(),
            )))
            .unwrap();
        assert!(outcome.is_applied());
        assert!(store.read(EXPENSES_KEY).unwrap().unwrap().contains("Cinema"));

        let reopened = ExpenseManager::open(Box::new(SharedStore(store)), clock()).unwrap();
        assert_eq!(reopened.state(), manager.state());
    }

    #[test]
    fn rejections_do_not_touch_storage() {
        let store = Arc::new(MemoryStorage::new());
        let mut manager =
            ExpenseManager::open(Box::new(SharedStore(Arc::clone(&store))), clock()).unwrap();
        let outcome = manager.dispatch(Action::SetBudget(-5.0)).unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected(Rejection::InvalidBudget(_))
        ));
        assert!(store.read(BUDGET_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_key_does_not_block_opening() {
        let store = Arc::new(MemoryStorage::new());
        store
            .write(
                EXPENSES_KEY,
                r#"[{"id":"k","amount":40,"description":"Cab","category":"2","date":"2025-09-01"}]"#,
            )
            .unwrap();
        store.write(BUDGET_KEY, "3000").unwrap();
        store.write(CATEGORIES_KEY, r#"[{"id":"x"}]"#).unwrap();

        let manager =
            ExpenseManager::open(Box::new(SharedStore(Arc::clone(&store))), clock()).unwrap();
        assert_eq!(manager.state().expenses().len(), 1);
        assert_eq!(manager.state().budget(), 3000.0);
        assert_eq!(manager.load_problems().len(), 1);
        assert_eq!(manager.load_problems()[0].key, CATEGORIES_KEY);
    }

    #[test]
    fn reset_erases_storage_and_restores_defaults() {
        let store = Arc::new(MemoryStorage::new());
        let mut manager =
            ExpenseManager::open(Box::new(SharedStore(Arc::clone(&store))), clock()).unwrap();
        manager
            .dispatch(Action::UpdateCategories(vec![Category::new("z", "Zed", "#000", "")]))
            .unwrap();
        manager.dispatch(Action::SetBudget(10.0)).unwrap();

        assert_eq!(manager.reset().unwrap(), 3);
        assert_eq!(manager.state(), &AppState::default());
        assert!(!store.contains(CATEGORIES_KEY).unwrap());
    }

    #[test]
    fn settings_round_trip_through_import() {
        let mut source = ExpenseManager::new(AppState::default(), clock());
        source.dispatch(Action::SetBudget(1200.0)).unwrap();
        let export = source.export_settings();

        let mut target = ExpenseManager::new(AppState::default(), clock());
        let outcome = target.import_settings(export).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(target.state().budget(), 1200.0);
        assert_eq!(target.state().categories(), source.state().categories());
    }
}
