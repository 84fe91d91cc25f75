//! Pipeline settings
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! `GREYHOUND_*` environment variables. The CLI applies its flags last and
//! calls [`Settings::validate`] again.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

use crate::core::strategy::CategoryRules;
use crate::error::ConfigError;
use crate::export::writer::ExportPaths;

/// Environment variable names
pub mod keys {
    pub const DATA_DIR: &str = "GREYHOUND_DATA_DIR";
    pub const STAKE_BACK: &str = "GREYHOUND_STAKE_BACK";
    pub const STAKE_LAY: &str = "GREYHOUND_STAKE_LAY";
    pub const BACK_PREFIXES: &str = "GREYHOUND_BACK_PREFIXES";
    pub const LAY_PREFIXES: &str = "GREYHOUND_LAY_PREFIXES";
    pub const KEEP_ALL_ACTIVE: &str = "GREYHOUND_KEEP_ALL_ACTIVE";
    pub const SKIP_PAST_RACES: &str = "GREYHOUND_SKIP_PAST_RACES";
    pub const PAST_RACE_GRACE_MINUTES: &str = "GREYHOUND_PAST_RACE_GRACE_MINUTES";
    pub const LOG_LEVEL: &str = "GREYHOUND_LOG_LEVEL";
}

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the raw and output directories
    pub data_dir: PathBuf,
    pub stake_back: f64,
    pub stake_lay: f64,
    pub back_category_prefixes: Vec<String>,
    pub lay_category_prefixes: Vec<String>,
    /// Append `#all_active#` to the import file
    pub keep_all_active: bool,
    pub skip_past_races: bool,
    pub past_race_grace_minutes: i64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        let rules = CategoryRules::default();
        Self {
            data_dir: PathBuf::from("data"),
            stake_back: 1.0,
            stake_lay: 1.0,
            back_category_prefixes: rules.back_prefixes().to_vec(),
            lay_category_prefixes: rules.lay_prefixes().to_vec(),
            keep_all_active: false,
            skip_past_races: true,
            past_race_grace_minutes: 2,
            log_level: "INFO".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then `path` if given, then the process environment.
    /// The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read a JSON settings file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from `lookup` (environment variable name to value).
    /// Unset and blank variables are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(keys::DATA_DIR) {
            self.data_dir = PathBuf::from(v.trim());
        }
        if let Some(v) = get(keys::STAKE_BACK) {
            self.stake_back = parse_value(keys::STAKE_BACK, &v)?;
        }
        if let Some(v) = get(keys::STAKE_LAY) {
            self.stake_lay = parse_value(keys::STAKE_LAY, &v)?;
        }
        if let Some(v) = get(keys::BACK_PREFIXES) {
            self.back_category_prefixes = parse_list(&v);
        }
        if let Some(v) = get(keys::LAY_PREFIXES) {
            self.lay_category_prefixes = parse_list(&v);
        }
        if let Some(v) = get(keys::KEEP_ALL_ACTIVE) {
            self.keep_all_active = parse_bool(keys::KEEP_ALL_ACTIVE, &v)?;
        }
        if let Some(v) = get(keys::SKIP_PAST_RACES) {
            self.skip_past_races = parse_bool(keys::SKIP_PAST_RACES, &v)?;
        }
        if let Some(v) = get(keys::PAST_RACE_GRACE_MINUTES) {
            self.past_race_grace_minutes = parse_value(keys::PAST_RACE_GRACE_MINUTES, &v)?;
        }
        if let Some(v) = get(keys::LOG_LEVEL) {
            self.log_level = v.trim().to_uppercase();
        }

        Ok(())
    }

    /// Check prefixes, stakes, grace period and log level
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.category_rules()?;
        self.tracing_level()?;
        if self.past_race_grace_minutes < 0 {
            return Err(ConfigError::InvalidValue {
                key: "past_race_grace_minutes".to_string(),
                value: self.past_race_grace_minutes.to_string(),
            });
        }
        Ok(())
    }

    /// Validated strategy rules
    pub fn category_rules(&self) -> Result<CategoryRules, ConfigError> {
        CategoryRules::new(
            self.back_category_prefixes.as_slice(),
            self.lay_category_prefixes.as_slice(),
            self.stake_back,
            self.stake_lay,
        )
    }

    pub fn tracing_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim()).map_err(|_| ConfigError::InvalidValue {
            key: "log_level".to_string(),
            value: self.log_level.clone(),
        })
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw").join("timeform_forecast")
    }

    pub fn top3_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("top3")
    }

    pub fn forecast_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("forecast")
    }

    pub fn marketfeeder_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("marketfeeder")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.marketfeeder_dir().join("history")
    }

    pub fn raw_path(&self, date: &str) -> PathBuf {
        self.raw_dir().join(format!("timeform_forecast_{}.csv", date))
    }

    pub fn top3_path(&self, date: &str) -> PathBuf {
        self.top3_dir().join(format!("top3_{}.csv", date))
    }

    pub fn forecast_path(&self, date: &str) -> PathBuf {
        self.forecast_dir().join(format!("forecast_{}.csv", date))
    }

    pub fn export_paths(&self, date: &str) -> ExportPaths {
        ExportPaths::for_date(&self.marketfeeder_dir(), &self.history_dir(), date)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Comma-separated list, blanks dropped
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.back_category_prefixes, vec!["A", "OR"]);
        assert_eq!(s.lay_category_prefixes, vec!["D", "HP"]);
        assert!((s.stake_back - 1.0).abs() < 1e-9);
        assert!(!s.keep_all_active);
        assert!(s.skip_past_races);
        assert_eq!(s.past_race_grace_minutes, 2);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_paths() {
        let s = Settings::default();
        assert_eq!(
            s.raw_path("2025-01-14"),
            Path::new("data/raw/timeform_forecast/timeform_forecast_2025-01-14.csv")
        );
        assert_eq!(
            s.forecast_path("2025-01-14"),
            Path::new("data/output/forecast/forecast_2025-01-14.csv")
        );
        assert_eq!(s.top3_path("2025-01-14"), Path::new("data/output/top3/top3_2025-01-14.csv"));
        assert_eq!(
            s.export_paths("2025-01-14").history,
            Path::new("data/output/marketfeeder/history/import_selections_2025-01-14.txt")
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            (keys::STAKE_BACK, "2.5"),
            (keys::LAY_PREFIXES, "D, HP ,S"),
            (keys::KEEP_ALL_ACTIVE, "yes"),
            (keys::PAST_RACE_GRACE_MINUTES, "5"),
            (keys::DATA_DIR, " /tmp/dogs "),
            (keys::LOG_LEVEL, "debug"),
            (keys::STAKE_LAY, "  "),
        ]);

        let mut s = Settings::default();
        s.apply_env_with(|k| vars.get(k).cloned()).unwrap();

        assert!((s.stake_back - 2.5).abs() < 1e-9);
        assert!((s.stake_lay - 1.0).abs() < 1e-9);
        assert_eq!(s.lay_category_prefixes, vec!["D", "HP", "S"]);
        assert!(s.keep_all_active);
        assert_eq!(s.past_race_grace_minutes, 5);
        assert_eq!(s.data_dir, PathBuf::from("/tmp/dogs"));
        assert_eq!(s.tracing_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_env_invalid_values() {
        let vars = env(&[(keys::SKIP_PAST_RACES, "maybe")]);
        let err = Settings::default()
            .apply_env_with(|k| vars.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let vars = env(&[(keys::STAKE_BACK, "one")]);
        assert!(Settings::default()
            .apply_env_with(|k| vars.get(k).cloned())
            .is_err());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let s = Settings {
            back_category_prefixes: vec!["A".to_string()],
            lay_category_prefixes: vec!["A1".to_string()],
            ..Settings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(ConfigError::OverlappingPrefixes { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_level_and_grace() {
        let s = Settings {
            log_level: "LOUD".to_string(),
            ..Settings::default()
        };
        assert!(s.validate().is_err());

        let s = Settings {
            past_race_grace_minutes: -1,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"stake_lay": 3.0, "keep_all_active": true}"#).unwrap();

        let s = Settings::from_file(&path).unwrap();
        assert!((s.stake_lay - 3.0).abs() < 1e-9);
        assert!(s.keep_all_active);
        assert_eq!(s.back_category_prefixes, vec!["A", "OR"]);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Settings::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").unwrap();
        assert!(matches!(Settings::from_file(&bad), Err(ConfigError::Parse(_))));
    }
}
