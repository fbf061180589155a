//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Runtime configuration for the intake service.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// libSQL database file.
    pub db_path: PathBuf,
    /// HTTP port for the onboarding API.
    pub port: u16,
    /// Settings namespace for the draft and session slots (single-user device).
    pub user_id: String,
    /// Directory for daily-rolling log files. Console-only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/fitgoal.db"),
            port: 8080,
            user_id: "default".to_string(),
            log_dir: None,
        }
    }
}

impl IntakeConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = lookup("FITGOAL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let port = match lookup("FITGOAL_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "FITGOAL_PORT".to_string(),
                message: format!("{raw:?} is not a valid port: {e}"),
            })?,
            None => defaults.port,
        };

        let user_id = lookup("FITGOAL_USER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.user_id);

        let log_dir = lookup("FITGOAL_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            db_path,
            port,
            user_id,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = IntakeConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./data/fitgoal.db"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.user_id, "default");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = IntakeConfig::from_lookup(lookup_from(&[
            ("FITGOAL_DB_PATH", "/tmp/x.db"),
            ("FITGOAL_PORT", "9090"),
            ("FITGOAL_USER", "alex"),
            ("FITGOAL_LOG_DIR", "/var/log/fitgoal"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.port, 9090);
        assert_eq!(config.user_id, "alex");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/fitgoal")));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = IntakeConfig::from_lookup(lookup_from(&[("FITGOAL_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "FITGOAL_PORT"));
    }

    #[test]
    fn blank_user_falls_back_to_default() {
        let config = IntakeConfig::from_lookup(lookup_from(&[("FITGOAL_USER", "  ")])).unwrap();
        assert_eq!(config.user_id, "default");
    }
}
