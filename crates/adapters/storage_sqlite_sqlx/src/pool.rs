//! `SQLite` connection setup: the reader pool, the single writer, and the
//! migrations run when the store is opened.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqliteConnection, SqlitePool};
use tokio::sync::{Mutex, MutexGuard};

use scoreboard_domain::collation::{COLLATION_NAME, localized_case_insensitive};

use crate::error::StorageError;
use crate::migrations::{self, AppliedMigration, MigrationReport, Migrator};

/// Configuration for the `SQLite` storage adapter.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:scoreboard.db` or `sqlite::memory:`).
    pub database_url: String,
    /// Wipe and rebuild the store when the migration steps changed.
    pub erase_on_schema_change: bool,
}

impl Config {
    /// Read configuration from environment variables.
    ///
    /// `SCOREBOARD_ERASE_ON_SCHEMA_CHANGE` is enabled by `1` or `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SCOREBOARD_DATABASE_URL` is not set.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Self::from_vars(|name| std::env::var(name))
    }

    fn from_vars<F>(var: F) -> Result<Self, std::env::VarError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let erase_on_schema_change = var("SCOREBOARD_ERASE_ON_SCHEMA_CHANGE")
            .is_ok_and(|value| matches!(value.trim(), "1" | "true"));
        Ok(Self {
            database_url: var("SCOREBOARD_DATABASE_URL")?,
            erase_on_schema_change,
        })
    }

    /// Build a [`Database`] from this configuration.
    ///
    /// Creates the database file if missing, runs all pending migrations,
    /// and opens the reader pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::initialize(&self).await
    }
}

/// An opened store.
///
/// Reads go through a connection pool. Writes are serialized through one
/// dedicated connection: holding it is what makes a write transaction
/// exclusive, and changes are announced before it is released.
pub struct Database {
    pool: SqlitePool,
    writer: Mutex<SqliteConnection>,
    migration_report: MigrationReport,
}

impl Database {
    async fn initialize(config: &Config) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .collation(COLLATION_NAME, localized_case_insensitive);

        let mut writer = options.connect().await?;
        let migration_report = Migrator::default()
            .erase_database_on_schema_change(config.erase_on_schema_change)
            .run(&mut writer)
            .await?;
        if migration_report.erased {
            tracing::warn!("stored data was erased after a schema change");
        }

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self {
            pool,
            writer: Mutex::new(writer),
            migration_report,
        })
    }

    /// Borrow the reader pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for exclusive use of the writer connection.
    pub async fn writer(&self) -> MutexGuard<'_, SqliteConnection> {
        self.writer.lock().await
    }

    /// What the migrations did when this store was opened.
    #[must_use]
    pub fn migration_report(&self) -> &MigrationReport {
        &self.migration_report
    }

    /// List the recorded migration steps.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the bookkeeping table cannot be read.
    pub async fn applied_migrations(&self) -> Result<Vec<AppliedMigration>, StorageError> {
        let mut writer = self.writer().await;
        migrations::applied_migrations(&mut writer).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) async fn memory_database() -> Database {
        Config {
            database_url: "sqlite::memory:".to_string(),
            erase_on_schema_change: false,
        }
        .build()
        .await
        .unwrap()
    }

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned().ok_or(std::env::VarError::NotPresent)
    }

    #[test]
    fn should_read_config_from_vars() {
        let config = Config::from_vars(lookup(&[
            ("SCOREBOARD_DATABASE_URL", "sqlite:demo.db"),
            ("SCOREBOARD_ERASE_ON_SCHEMA_CHANGE", " true "),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite:demo.db");
        assert!(config.erase_on_schema_change);
    }

    #[test]
    fn should_keep_erase_mode_off_unless_enabled() {
        let config = Config::from_vars(lookup(&[
            ("SCOREBOARD_DATABASE_URL", "sqlite::memory:"),
            ("SCOREBOARD_ERASE_ON_SCHEMA_CHANGE", "yes"),
        ]))
        .unwrap();
        assert!(!config.erase_on_schema_change);

        let config =
            Config::from_vars(lookup(&[("SCOREBOARD_DATABASE_URL", "sqlite::memory:")])).unwrap();
        assert!(!config.erase_on_schema_change);
    }

    #[test]
    fn should_fail_without_database_url() {
        let err = Config::from_vars(lookup(&[("SCOREBOARD_ERASE_ON_SCHEMA_CHANGE", "1")]))
            .unwrap_err();
        assert_eq!(err, std::env::VarError::NotPresent);
    }

    #[tokio::test]
    async fn should_create_schema_when_using_memory_db() {
        let db = memory_database().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != 'schema_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|row| row.0.as_str()).collect();
        assert_eq!(names, ["player", "team"]);
        assert_eq!(db.migration_report().applied.len(), 2);
        assert_eq!(db.applied_migrations().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_share_memory_store_between_writer_and_readers() {
        let db = memory_database().await;
        {
            let mut writer = db.writer().await;
            sqlx::query("INSERT INTO team (teamName, firstTeamDate) VALUES ('Red', '2020-01-01')")
                .execute(&mut *writer)
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn should_register_case_insensitive_collation() {
        let db = memory_database().await;

        let equal: i64 =
            sqlx::query_scalar("SELECT 'ALICE' = 'alice' COLLATE localized_case_insensitive")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(equal, 1);
    }

    #[tokio::test]
    async fn should_enforce_foreign_keys() {
        let db = memory_database().await;

        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
