use dirs::home_dir;
use std::{env, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".expense_core";
const STORE_DIR: &str = "store";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const EXPORT_DIR: &str = "exports";

/// Returns the application data directory: `$EXPENSE_CORE_HOME` when set,
/// otherwise `~/.expense_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("EXPENSE_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding one JSON file per persisted key.
pub fn store_dir() -> PathBuf {
    app_data_dir().join(STORE_DIR)
}

pub fn config_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    config_dir_in(base).join(CONFIG_FILE)
}

/// Default destination for settings exports.
pub fn export_dir() -> PathBuf {
    app_data_dir().join(EXPORT_DIR)
}
