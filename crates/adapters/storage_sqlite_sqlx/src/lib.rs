//! # scoreboard-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `scoreboard-app::ports::storage`
//! - Open the store: one writer connection plus a reader pool
//! - Run the embedded schema migrations
//! - Announce committed changes to the change feed
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `scoreboard-app` (for port traits) and `scoreboard-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod migrations;
pub mod player_repo;
pub mod pool;
pub mod team_repo;

pub use error::{StorageError, constraint_violation};
pub use migrations::{AppliedMigration, Migration, MigrationReport, Migrator};
pub use player_repo::SqlitePlayerRepository;
pub use pool::{Config, Database};
pub use team_repo::SqliteTeamRepository;
