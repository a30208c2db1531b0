//! Team service — use-cases for managing teams.

use std::collections::BTreeSet;
use std::sync::Arc;

use scoreboard_domain::error::{NotFoundError, ScoreboardError};
use scoreboard_domain::id::TeamId;
use scoreboard_domain::table::{Table, TableSet};
use scoreboard_domain::team::Team;

use crate::live_query::LiveQuery;
use crate::ports::{ChangeSubscriber, TeamRepository};

/// Application service for team CRUD and live reads.
pub struct TeamService<R, S> {
    repo: Arc<R>,
    changes: S,
}

impl<R, S> TeamService<R, S>
where
    R: TeamRepository + Send + Sync + 'static,
    S: ChangeSubscriber,
{
    /// Create a new service backed by the given repository and change feed.
    pub fn new(repo: R, changes: S) -> Self {
        Self {
            repo: Arc::new(repo),
            changes,
        }
    }

    /// Insert or update a team after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    pub async fn save_team(&self, team: Team) -> Result<Team, ScoreboardError> {
        team.validate()?;
        self.repo.save(team).await
    }

    /// Look up a team by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::NotFound`] when no team with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_team(&self, id: TeamId) -> Result<Team, ScoreboardError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Team",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all teams ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_teams(&self) -> Result<Vec<Team>, ScoreboardError> {
        self.repo.fetch_all().await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn count_teams(&self) -> Result<u64, ScoreboardError> {
        self.repo.count().await
    }

    /// Delete the teams in `ids` together with their players.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_teams(&self, ids: &BTreeSet<TeamId>) -> Result<u64, ScoreboardError> {
        self.repo.delete(ids).await
    }

    /// Delete every team together with every player.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_all_teams(&self) -> Result<u64, ScoreboardError> {
        self.repo.delete_all().await
    }

    /// Observe all teams ordered by name.
    pub fn observe_teams(&self) -> LiveQuery<Team> {
        let repo = Arc::clone(&self.repo);
        LiveQuery::spawn(
            self.changes.subscribe(),
            TableSet::single(Table::Team),
            move || {
                let repo = Arc::clone(&repo);
                async move { repo.fetch_all().await }
            },
        )
    }
}
