use cadence_core::recurrence::ExpansionConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// Partition of the document store the CLI reads and writes.
    pub user: String,
    pub calendar: CalendarConfig,
    pub expansion: ExpansionConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CalendarConfig {
    pub week_starts_monday: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_starts_monday: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("cadence.db"),
            user: "default".to_string(),
            calendar: CalendarConfig::default(),
            expansion: ExpansionConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then `cadence.toml`, then `CADENCE_*` environment variables
    /// (`__` separates nested keys, e.g. `CADENCE_EXPANSION__LOOKAHEAD_YEARS`).
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("CADENCE_").split("__"))
    }
}
