use crate::application::Config;
use crate::domain::{DeletePolicy, Roster, WeekdayIndexing};
use crate::infrastructure::DuckDbStorage;
use anyhow::Context;
use chrono::{Local, NaiveDate};

pub struct PtoApp {
    pub roster: Roster,
    config: Config,
    today: NaiveDate,
}

impl PtoApp {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(Config::from_env()?)
    }

    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        let storage = DuckDbStorage::new(&config.db_path)
            .with_context(|| format!("opening database at {}", config.db_path.display()))?;
        let roster = Roster::new(Box::new(storage), config.delete_policy);
        log::debug!(
            "opened {} with {} (delete policy {})",
            config.db_path.display(),
            roster.backend_info(),
            roster.policy()
        );
        let today = Local::now().naive_local().date();

        Ok(Self {
            roster,
            config,
            today,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn weekdays(&self) -> WeekdayIndexing {
        self.config.weekdays
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.config.delete_policy
    }
}
