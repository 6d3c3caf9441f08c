use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::core::analytics::DEFAULT_TREND_MONTHS;
use crate::core::selectors::DEFAULT_RECENT_LIMIT;
use crate::errors::{ExpenseError, Result};
use crate::storage::json_backend::{tmp_path, write_atomic};
use crate::utils::{ensure_dir, paths};

/// User preferences that are not part of the expense state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency_symbol: String,
    pub locale: String,
    pub dark_mode: bool,
    pub recent_limit: usize,
    pub trend_months: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".into(),
            locale: "en-IN".into(),
            dark_mode: false,
            recent_limit: DEFAULT_RECENT_LIMIT,
            trend_months: DEFAULT_TREND_MONTHS,
        }
    }
}

impl Config {
    /// Rejects values the views cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.recent_limit == 0 {
            return Err(ExpenseError::Config("recent_limit must be at least 1".into()));
        }
        if self.trend_months == 0 || self.trend_months > 24 {
            return Err(ExpenseError::Config(
                "trend_months must be between 1 and 24".into(),
            ));
        }
        Ok(())
    }

    /// Currency symbol, grouped digits and two decimals. `*-IN` locales group
    /// lakh-style (`1,00,000.00`); every other locale groups by thousands.
    pub fn format_amount(&self, amount: f64) -> String {
        let fixed = format!("{:.2}", amount.abs());
        let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let grouped = group_digits(whole, self.uses_lakh_grouping());
        let sign = if amount < 0.0 { "-" } else { "" };
        format!("{sign}{}{grouped}.{fraction}", self.currency_symbol)
    }

    fn uses_lakh_grouping(&self) -> bool {
        self.locale
            .rsplit(['-', '_'])
            .next()
            .is_some_and(|region| region.eq_ignore_ascii_case("IN"))
    }
}

fn group_digits(whole: &str, lakh: bool) -> String {
    let digits: Vec<char> = whole.chars().collect();
    if digits.len() <= 3 {
        return whole.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let step = if lakh { 2 } else { 3 };
    let mut groups: Vec<String> = head
        .rchunks(step)
        .map(|chunk| chunk.iter().collect())
        .collect();
    groups.reverse();
    groups.push(tail.iter().collect());
    groups.join(",")
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&paths::config_dir_in(&base))?;
        Ok(Self {
            path: paths::config_file_in(&base),
        })
    }

    /// Reads the config file, or defaults when none has been saved yet.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| ExpenseError::Config(format!("{}: {err}", self.path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
