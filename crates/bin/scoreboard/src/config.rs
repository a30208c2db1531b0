//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `scoreboard.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use scoreboard_domain::ordering::PlayerOrdering;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Demo loop settings.
    pub demo: DemoConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Wipe and rebuild the store when the schema steps changed.
    pub erase_on_schema_change: bool,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Demo loop configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Order the live scoreboard is printed in.
    pub ordering: PlayerOrdering,
    /// Seconds between two random refreshes.
    pub refresh_interval_secs: u64,
    /// Number of refreshes before exiting, `0` to run until interrupted.
    pub rounds: u32,
    /// Seed for reproducible demo data.
    pub seed: Option<u64>,
    /// Print each delivery as a JSON line instead of a table.
    pub json: bool,
    /// Player names to draw from instead of the built-in pool.
    pub player_names: Option<Vec<String>>,
    /// Team names to draw from instead of the built-in pool.
    pub team_names: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from `scoreboard.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("scoreboard.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("SCOREBOARD_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("SCOREBOARD_ERASE_ON_SCHEMA_CHANGE") {
            self.database.erase_on_schema_change = parse_flag(&val);
        }
        if let Some(val) = var("SCOREBOARD_ORDERING") {
            self.demo.ordering = val
                .parse()
                .map_err(|err| ConfigError::Validation(format!("SCOREBOARD_ORDERING: {err}")))?;
        }
        if let Some(val) = var("SCOREBOARD_SEED") {
            self.demo.seed = Some(val.parse().map_err(|_| {
                ConfigError::Validation(format!("SCOREBOARD_SEED must be an integer, got {val:?}"))
            })?);
        }
        if let Some(val) = var("SCOREBOARD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.demo.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "refresh_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.demo.player_names.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Validation(
                "player_names must not be empty".to_string(),
            ));
        }
        if self.demo.team_names.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Validation(
                "team_names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:scoreboard.db?mode=rwc".to_string(),
            erase_on_schema_change: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "scoreboard=info,sqlx=warn".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            ordering: PlayerOrdering::default(),
            refresh_interval_secs: 2,
            rounds: 0,
            seed: None,
            json: false,
            player_names: None,
            team_names: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:scoreboard.db?mode=rwc");
        assert!(!config.database.erase_on_schema_change);
        assert_eq!(config.demo.ordering, PlayerOrdering::ByScore);
        assert_eq!(config.demo.refresh_interval_secs, 2);
        assert_eq!(config.demo.rounds, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.demo.refresh_interval_secs, 2);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [database]
            url = 'sqlite:test.db'
            erase_on_schema_change = true

            [logging]
            filter = 'debug'

            [demo]
            ordering = 'team'
            refresh_interval_secs = 5
            rounds = 3
            seed = 42
            json = true
            player_names = ['Ann', 'Bob']
            team_names = ['Red']
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database_url(), "sqlite:test.db");
        assert!(config.database.erase_on_schema_change);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.demo.ordering, PlayerOrdering::ByTeamName);
        assert_eq!(config.demo.refresh_interval_secs, 5);
        assert_eq!(config.demo.rounds, 3);
        assert_eq!(config.demo.seed, Some(42));
        assert!(config.demo.json);
        assert_eq!(config.demo.player_names.as_deref().unwrap(), ["Ann", "Bob"]);
        assert_eq!(config.demo.team_names.as_deref().unwrap(), ["Red"]);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.demo.refresh_interval_secs, 2);
    }

    #[test]
    fn should_reject_zero_refresh_interval() {
        let mut config = Config::default();
        config.demo.refresh_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_name_pools() {
        let mut config = Config::default();
        config.demo.player_names = Some(Vec::new());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.demo.team_names = Some(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("SCOREBOARD_DATABASE_URL", "sqlite::memory:"),
                ("SCOREBOARD_ERASE_ON_SCHEMA_CHANGE", "true"),
                ("SCOREBOARD_ORDERING", "name"),
                ("SCOREBOARD_SEED", "7"),
                ("SCOREBOARD_LOG", "warn"),
            ]))
            .unwrap();

        assert_eq!(config.database_url(), "sqlite::memory:");
        assert!(config.database.erase_on_schema_change);
        assert_eq!(config.demo.ordering, PlayerOrdering::ByName);
        assert_eq!(config.demo.seed, Some(7));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_prefer_rust_log_over_scoreboard_log() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("SCOREBOARD_LOG", "warn"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_unknown_ordering_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(env(&[("SCOREBOARD_ORDERING", "height")]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
