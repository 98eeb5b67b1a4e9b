use std::path::PathBuf;
use std::time::Duration;

use crate::{models::expiry::DUE_SOON_DAYS, repository::DEFAULT_EXPIRY_THRESHOLD_DAYS};

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Runtime settings, resolved from command-line flags and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Location of the JSON store
    pub store_path: PathBuf,
    /// Days a task may stay overdue before it is swept
    pub expiry_threshold_days: i64,
    /// How often `watch` sweeps and re-renders
    pub sweep_interval: Duration,
    /// Deadlines this many days ahead are highlighted as due soon
    pub due_soon_days: i64,
    /// Skip confirmation prompts
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            expiry_threshold_days: DEFAULT_EXPIRY_THRESHOLD_DAYS,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            due_soon_days: DUE_SOON_DAYS,
            assume_yes: false,
        }
    }
}

impl Config {
    pub fn from_overrides(
        store_path: Option<PathBuf>,
        expiry_threshold_days: Option<i64>,
        sweep_interval_secs: Option<u64>,
        due_soon_days: Option<i64>,
        assume_yes: bool,
    ) -> Self {
        let defaults = Self::default();
        Self {
            store_path: store_path.unwrap_or(defaults.store_path),
            expiry_threshold_days: expiry_threshold_days
                .unwrap_or(defaults.expiry_threshold_days),
            sweep_interval: sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            due_soon_days: due_soon_days.unwrap_or(defaults.due_soon_days),
            assume_yes,
        }
    }
}

/// `<local data dir>/todos/todos.json`, or `./todos.json` when the platform has
/// no data directory.
pub fn default_store_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("todos").join("todos.json"),
        None => PathBuf::from("todos.json"),
    }
}
