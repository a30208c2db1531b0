//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ScoreboardError`] via `#[from]` or a dedicated `From` impl.

/// Top-level error returned by services and repository ports.
#[derive(Debug, thiserror::Error)]
pub enum ScoreboardError {
    /// User input failed validation. Raised before any store access.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested record does not exist.
    #[error("record not found")]
    NotFound(#[from] NotFoundError),

    /// The storage engine rejected or failed an operation.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Field validation failures, worded for the person filling in a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please give a name to the player.")]
    MissingName,

    #[error("Please choose a team for the player.")]
    MissingTeam,

    #[error("Please give a name to the team.")]
    MissingTeamName,
}

/// A lookup by identity matched no row.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
