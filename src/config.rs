use std::{
    env,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tokio::fs;

use crate::{calendar::AuthStrategy, ledger::AD_HOC, parse::Diet, Error};

pub static DEFAULT_CONFIG_PATH: &str = "bandeco.toml";
pub static DEFAULT_LEDGER_PATH: &str = "backup.txt";

fn default_ledger() -> String {
    DEFAULT_LEDGER_PATH.to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub calendar_id: String,
    pub veg_calendar_id: String,
    /// A file path, or `:memory:`.
    #[serde(default = "default_ledger")]
    pub ledger: String,
    #[serde(default)]
    pub auth: AuthStrategy,
}

/// Target calendar for each diet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarIds {
    pub standard: String,
    pub vegan: String,
}

impl CalendarIds {
    pub fn for_diet(&self, diet: Diet) -> &str {
        match diet {
            Diet::Standard => &self.standard,
            Diet::Vegan => &self.vegan,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::config_error(e.to_string()))?;
        config.validate()
    }

    /// The old `IDs.txt`: standard calendar id on the first line, vegan on
    /// the second.
    pub fn from_id_lines(s: &str) -> crate::Result<Self> {
        let mut ids = s.lines().map(str::trim).filter(|l| !l.is_empty());
        let (Some(standard), Some(vegan)) = (ids.next(), ids.next()) else {
            return Err(Error::config_error(
                "expected two calendar ids, one per line",
            ));
        };
        Ok(Self {
            calendar_id: standard.to_owned(),
            veg_calendar_id: vegan.to_owned(),
            ledger: default_ledger(),
            auth: AuthStrategy::default(),
        })
    }

    /// Reads `path`, else `$BANDECO_CONFIG`, else `./bandeco.toml`, then
    /// applies the `BANDECO_*` overrides.
    pub async fn load(path: Option<PathBuf>) -> crate::Result<Self> {
        let path = match (path, env::var("BANDECO_CONFIG")) {
            (Some(p), _) => p,
            (None, Ok(p)) => PathBuf::from(p),
            (None, Err(_)) => PathBuf::from(DEFAULT_CONFIG_PATH),
        };
        let text = fs::read_to_string(&path).await.map_err(|e| {
            Error::config_error(format!("could not read {}: {e}", path.display()))
        })?;
        let config = if is_legacy(&path) {
            Self::from_id_lines(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        log::debug!("Loaded config from {}", path.display());
        config
            .with_overrides(|name| env::var(name).ok())
            .validate()
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ledger) = var("BANDECO_LEDGER") {
            self.ledger = ledger;
        }
        if let Some(id) = var("BANDECO_CALENDAR_ID") {
            self.calendar_id = id;
        }
        if let Some(id) = var("BANDECO_VEG_CALENDAR_ID") {
            self.veg_calendar_id = id;
        }
        self
    }

    fn validate(self) -> crate::Result<Self> {
        if self.calendar_id.trim().is_empty() || self.veg_calendar_id.trim().is_empty() {
            return Err(Error::config_error("calendar ids must not be empty"));
        }
        if self.ledger.is_empty() {
            return Err(Error::config_error(format!(
                "ledger must be a path or {AD_HOC}"
            )));
        }
        Ok(self)
    }

    pub fn calendars(&self) -> CalendarIds {
        CalendarIds {
            standard: self.calendar_id.clone(),
            vegan: self.veg_calendar_id.clone(),
        }
    }
}

fn is_legacy(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}
