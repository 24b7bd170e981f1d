//! Process settings from the environment (after `.env` is loaded by the binary).

use crate::error::ConfigError;
use std::collections::HashMap;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/failsafe";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    /// PostgreSQL schema holding the collection tables.
    pub schema: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            schema: DEFAULT_SCHEMA.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Settings {
    /// Read `FAILSAFE_*` variables; `DATABASE_URL` is accepted when `FAILSAFE_DB_URL` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |k: &str| vars.get(k).map(|v| v.trim()).filter(|v| !v.is_empty());
        let defaults = Settings::default();
        Ok(Settings {
            database_url: get("FAILSAFE_DB_URL")
                .or_else(|| get("DATABASE_URL"))
                .map(str::to_string)
                .unwrap_or(defaults.database_url),
            schema: get("FAILSAFE_SCHEMA").map(str::to_string).unwrap_or(defaults.schema),
            bind_addr: get("FAILSAFE_BIND_ADDR").map(str::to_string).unwrap_or(defaults.bind_addr),
            max_connections: match get("FAILSAFE_MAX_CONNECTIONS") {
                Some(v) => v.parse().ok().filter(|n: &u32| *n > 0).ok_or_else(|| {
                    ConfigError::Settings(format!("FAILSAFE_MAX_CONNECTIONS must be a positive integer, got '{}'", v))
                })?,
                None => defaults.max_connections,
            },
            body_limit: match get("FAILSAFE_BODY_LIMIT") {
                Some(v) => v.parse().map_err(|_| {
                    ConfigError::Settings(format!("FAILSAFE_BODY_LIMIT must be a byte count, got '{}'", v))
                })?,
                None => defaults.body_limit,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(Settings::from_vars(HashMap::new()).unwrap(), Settings::default());
    }

    #[test]
    fn failsafe_url_wins_over_database_url() {
        let s = Settings::from_vars(vars(&[
            ("DATABASE_URL", "postgres://other/db"),
            ("FAILSAFE_DB_URL", "postgres://db/failsafe"),
        ]))
        .unwrap();
        assert_eq!(s.database_url, "postgres://db/failsafe");

        let s = Settings::from_vars(vars(&[("DATABASE_URL", "postgres://other/db")])).unwrap();
        assert_eq!(s.database_url, "postgres://other/db");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = Settings::from_vars(vars(&[("FAILSAFE_MAX_CONNECTIONS", "many")]));
        assert!(matches!(err, Err(ConfigError::Settings(_))));
        let err = Settings::from_vars(vars(&[("FAILSAFE_MAX_CONNECTIONS", "0")]));
        assert!(matches!(err, Err(ConfigError::Settings(ref m)) if m.contains("positive")));
        let err = Settings::from_vars(vars(&[("FAILSAFE_BODY_LIMIT", "-1")]));
        assert!(matches!(err, Err(ConfigError::Settings(_))));
        let ok = Settings::from_vars(vars(&[("FAILSAFE_MAX_CONNECTIONS", "12")])).unwrap();
        assert_eq!(ok.max_connections, 12);
    }
}
