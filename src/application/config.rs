use crate::domain::{DeletePolicy, WeekdayIndexing};
use anyhow::{Context, anyhow};
use std::path::PathBuf;

pub const DB_FILE: &str = "ptokeeper.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub delete_policy: DeletePolicy,
    pub weekdays: WeekdayIndexing,
    /// `dark`, `light` or `minimal`.
    pub theme: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let data_dir = lookup("PTOKEEPER_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("ptokeeper")
            });
        let db_path = data_dir.join(DB_FILE);

        let delete_policy = match lookup("PTOKEEPER_DELETE_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("reading PTOKEEPER_DELETE_POLICY")?,
            None => DeletePolicy::default(),
        };

        let weekdays = match lookup("PTOKEEPER_WEEKDAYS") {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("reading PTOKEEPER_WEEKDAYS")?,
            None => WeekdayIndexing::default(),
        };

        let theme = lookup("PTOKEEPER_THEME").unwrap_or_else(|| "dark".to_string());

        Ok(Self {
            data_dir,
            db_path,
            delete_policy,
            weekdays,
            theme,
        })
    }
}
