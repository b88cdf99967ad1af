//! trackline configuration.
//!
//! Loaded from `$TRACKLINE_CONFIG` if set, else `~/.trackline/config.toml`.
//! A missing file means defaults; every key is optional.

use std::{env, fs, io, path::Path, path::PathBuf, time::Duration};

use jiff::{SignedDuration, tz::TimeZone};
use serde::{Deserialize, Serialize};

use crate::normalize::DEFAULT_FALLBACK_STEP_SECONDS;

/// trackline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Seconds between consecutive stops that have no parseable time of day.
    pub fallback_step_seconds: i64,

    /// How often a polling host re-reads the clock's start time.
    pub anchor_poll_millis: u64,

    /// How long a selected or externally flashed entry stays highlighted.
    pub flash_millis: u64,

    /// IANA zone used when printing instants. Ordering is always UTC.
    pub display_time_zone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_step_seconds: DEFAULT_FALLBACK_STEP_SECONDS,
            anchor_poll_millis: 500,
            flash_millis: 1000,
            display_time_zone: "UTC".to_string(),
        }
    }
}

impl Config {
    /// Load config from the resolved path, falling back to defaults when
    /// there is no file.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };
        Self::from_toml(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// The config file path: `$TRACKLINE_CONFIG`, else `~/.trackline/config.toml`.
    pub fn path() -> Option<PathBuf> {
        if let Ok(path) = env::var("TRACKLINE_CONFIG")
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|h| h.join(".trackline").join("config.toml"))
    }

    pub fn anchor_poll_interval(&self) -> Duration {
        Duration::from_millis(self.anchor_poll_millis)
    }

    pub fn flash_duration(&self) -> SignedDuration {
        SignedDuration::from_millis(i64::try_from(self.flash_millis).unwrap_or(i64::MAX))
    }

    /// The display zone. `UTC` never needs the system time zone database.
    pub fn time_zone(&self) -> Result<TimeZone, String> {
        if self.display_time_zone.eq_ignore_ascii_case("UTC") {
            return Ok(TimeZone::UTC);
        }
        TimeZone::get(&self.display_time_zone)
            .map_err(|e| format!("unknown display-time-zone '{}': {e}", self.display_time_zone))
    }

    fn validate(&self) -> Result<(), String> {
        if self.fallback_step_seconds <= 0 {
            return Err(format!(
                "fallback-step-seconds must be positive, got {}",
                self.fallback_step_seconds
            ));
        }
        if self.anchor_poll_millis == 0 {
            return Err("anchor-poll-millis must be positive".to_string());
        }
        self.time_zone().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.fallback_step_seconds, 5);
        assert_eq!(config.anchor_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.flash_duration(), SignedDuration::from_secs(1));
        assert_eq!(config.time_zone().unwrap(), TimeZone::UTC);
    }

    #[test]
    fn partial_override() {
        let config = Config::from_toml("fallback-step-seconds = 30\nflash-millis = 250\n").unwrap();
        assert_eq!(config.fallback_step_seconds, 30);
        assert_eq!(config.flash_millis, 250);
        assert_eq!(config.anchor_poll_millis, 500);
    }

    #[test]
    fn rejects_non_positive_step() {
        let err = Config::from_toml("fallback-step-seconds = 0").unwrap_err();
        assert!(err.contains("fallback-step-seconds"), "{err}");
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = Config::from_toml("anchor-poll-millis = 0").unwrap_err();
        assert!(err.contains("anchor-poll-millis"), "{err}");
    }

    #[test]
    fn rejects_wrong_value_types() {
        assert!(Config::from_toml("fallback-step-seconds = \"five\"").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "display-time-zone = \"utc\"\nfallback-step-seconds = 10\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.fallback_step_seconds, 10);
        assert_eq!(config.time_zone().unwrap(), TimeZone::UTC);
    }

    #[test]
    fn invalid_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "fallback-step-seconds = -1").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("config.toml"), "{err}");
    }
}
