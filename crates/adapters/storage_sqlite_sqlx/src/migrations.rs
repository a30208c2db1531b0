//! Schema migrations.
//!
//! Steps are embedded at compile time and recorded in `schema_migrations`
//! together with a SHA-256 checksum of their SQL. Each step runs in its own
//! transaction: a failing step is rolled back and leaves earlier steps
//! recorded.

use sha2::{Digest, Sha256};
use sqlx::{Connection, SqliteConnection};

use crate::error::StorageError;

const CREATE_BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    id TEXT PRIMARY KEY NOT NULL,
    checksum TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";
const SELECT_APPLIED: &str =
    "SELECT id, checksum, applied_at FROM schema_migrations ORDER BY rowid";
const RECORD_APPLIED: &str =
    "INSERT INTO schema_migrations (id, checksum, applied_at) VALUES (?, ?, datetime('now'))";
const SELECT_SCHEMA_OBJECTS: &str = "SELECT type, name FROM sqlite_master \
     WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
     ORDER BY type DESC, name";

/// One schema step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

impl Migration {
    #[must_use]
    pub const fn new(id: &'static str, sql: &'static str) -> Self {
        Self { id, sql }
    }

    /// Hex-encoded SHA-256 of the step's SQL.
    #[must_use]
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// The steps building the player and team schema, in order.
pub const EMBEDDED: &[Migration] = &[
    Migration::new(
        "0001_create_team",
        include_str!("../migrations/0001_create_team.sql"),
    ),
    Migration::new(
        "0002_create_player",
        include_str!("../migrations/0002_create_player.sql"),
    ),
];

/// A step recorded as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub id: String,
    pub checksum: String,
    pub applied_at: String,
}

/// What a [`Migrator::run`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Identifiers of the steps applied by this run, in order.
    pub applied: Vec<String>,
    /// Whether previously stored data was erased first.
    pub erased: bool,
}

/// Applies pending [`Migration`]s to a connection.
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<Migration>,
    erase_database_on_schema_change: bool,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(EMBEDDED.to_vec())
    }
}

impl Migrator {
    #[must_use]
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self {
            migrations,
            erase_database_on_schema_change: false,
        }
    }

    /// When enabled, a store whose recorded steps differ from the current
    /// definitions is wiped and rebuilt instead of being rejected.
    ///
    /// Intended for development only: it destroys all stored data.
    #[must_use]
    pub fn erase_database_on_schema_change(mut self, enabled: bool) -> Self {
        self.erase_database_on_schema_change = enabled;
        self
    }

    /// Apply every step not yet recorded, in order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ChecksumMismatch`] when a recorded step was
    /// modified and erasing is disabled, [`StorageError::Migration`] when a
    /// step fails, or [`StorageError::Database`] on bookkeeping failures.
    pub async fn run(&self, conn: &mut SqliteConnection) -> Result<MigrationReport, StorageError> {
        sqlx::query(CREATE_BOOKKEEPING).execute(&mut *conn).await?;
        let mut recorded = applied_migrations(conn).await?;
        let mut report = MigrationReport::default();

        if self.erase_database_on_schema_change {
            if !self.matches(&recorded) {
                tracing::warn!(
                    recorded = recorded.len(),
                    defined = self.migrations.len(),
                    "schema definitions changed, erasing database"
                );
                erase(conn).await?;
                sqlx::query(CREATE_BOOKKEEPING).execute(&mut *conn).await?;
                report.erased = !recorded.is_empty();
                recorded.clear();
            }
        } else {
            self.verify(&recorded)?;
        }

        for migration in &self.migrations {
            if recorded.iter().any(|applied| applied.id == migration.id) {
                continue;
            }
            apply(conn, migration).await?;
            tracing::info!(id = migration.id, "applied migration");
            report.applied.push(migration.id.to_string());
        }

        Ok(report)
    }

    fn matches(&self, recorded: &[AppliedMigration]) -> bool {
        recorded.len() == self.migrations.len()
            && recorded
                .iter()
                .zip(&self.migrations)
                .all(|(applied, migration)| {
                    applied.id == migration.id && applied.checksum == migration.checksum()
                })
    }

    fn verify(&self, recorded: &[AppliedMigration]) -> Result<(), StorageError> {
        for applied in recorded {
            match self.migrations.iter().find(|m| m.id == applied.id) {
                Some(migration) if migration.checksum() != applied.checksum => {
                    return Err(StorageError::ChecksumMismatch {
                        id: applied.id.clone(),
                    });
                }
                Some(_) => {}
                None => tracing::warn!(id = %applied.id, "recorded migration has no definition"),
            }
        }
        Ok(())
    }
}

/// List the recorded steps in the order they were applied.
///
/// # Errors
///
/// Returns [`StorageError::Database`] if the bookkeeping table cannot be read.
pub async fn applied_migrations(
    conn: &mut SqliteConnection,
) -> Result<Vec<AppliedMigration>, StorageError> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(SELECT_APPLIED)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, checksum, applied_at)| AppliedMigration {
            id,
            checksum,
            applied_at,
        })
        .collect())
}

async fn apply(conn: &mut SqliteConnection, migration: &Migration) -> Result<(), StorageError> {
    let mut tx = conn.begin().await?;
    sqlx::raw_sql(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(|source| StorageError::Migration {
            id: migration.id.to_string(),
            source,
        })?;
    sqlx::query(RECORD_APPLIED)
        .bind(migration.id)
        .bind(migration.checksum())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

async fn erase(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&mut *conn)
        .await?;
    let dropped = drop_schema_objects(conn).await;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;
    dropped
}

async fn drop_schema_objects(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    let mut tx = conn.begin().await?;
    let objects: Vec<(String, String)> = sqlx::query_as(SELECT_SCHEMA_OBJECTS)
        .fetch_all(&mut *tx)
        .await?;
    for (kind, name) in objects {
        let statement = format!(
            "DROP {} IF EXISTS \"{}\"",
            kind.to_uppercase(),
            name.replace('"', "\"\"")
        );
        sqlx::query(&statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
