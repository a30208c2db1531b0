//! # scoreboard-app
//!
//! Application layer — use-cases, live queries, and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `PlayerRepository` — transactional writes and ordered reads of players
//!   - `TeamRepository` — the same for teams
//!   - `ChangePublisher` / `ChangeSubscriber` — committed table changes
//!   - `DataGenerator` — random values for demo data
//! - Define **driving/inbound ports** as use-case structs:
//!   - `PlayerService` — save, delete, demo refresh, one-shot and live reads
//!   - `TeamService` — the team counterparts
//!   - `PlayerForm` — form view-model validating edits before saving
//! - Provide **in-process infrastructure** that doesn't need IO: the change
//!   bus and the live query machinery
//!
//! ## Dependency rule
//! Depends on `scoreboard-domain` only (plus `tokio` for channels and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod change_bus;
pub mod live_query;
pub mod ports;
pub mod services;
