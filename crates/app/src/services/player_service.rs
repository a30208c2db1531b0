//! Player service — use-cases for managing players.

use std::collections::BTreeSet;
use std::sync::Arc;

use scoreboard_domain::error::{NotFoundError, ScoreboardError};
use scoreboard_domain::id::PlayerId;
use scoreboard_domain::ordering::PlayerOrdering;
use scoreboard_domain::player::Player;

use crate::live_query::LiveQuery;
use crate::ports::{ChangeSubscriber, DataGenerator, PlayerRepository, RefreshOutcome};
use crate::services::demo::DemoPlanner;

/// Application service for player CRUD, demo data, and live reads.
pub struct PlayerService<R, S, G> {
    repo: Arc<R>,
    changes: S,
    generator: G,
}

impl<R, S, G> PlayerService<R, S, G>
where
    R: PlayerRepository + Send + Sync + 'static,
    S: ChangeSubscriber,
    G: DataGenerator + Sync,
{
    /// Create a new service backed by the given repository, change feed, and
    /// demo data generator.
    pub fn new(repo: R, changes: S, generator: G) -> Self {
        Self {
            repo: Arc::new(repo),
            changes,
            generator,
        }
    }

    /// Insert or update a player after validating domain invariants.
    ///
    /// The returned player carries its identity.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    pub async fn save_player(&self, player: Player) -> Result<Player, ScoreboardError> {
        player.validate()?;
        self.repo.save(player).await
    }

    /// Insert or update several players in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Validation`] if any player is invalid, in
    /// which case nothing is written, or a storage error from the repository.
    pub async fn save_players(&self, players: Vec<Player>) -> Result<Vec<Player>, ScoreboardError> {
        for player in &players {
            player.validate()?;
        }
        self.repo.save_all(players).await
    }

    /// Look up a player by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::NotFound`] when no player with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_player(&self, id: PlayerId) -> Result<Player, ScoreboardError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Player",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all players in the given order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_players(
        &self,
        ordering: PlayerOrdering,
    ) -> Result<Vec<Player>, ScoreboardError> {
        self.repo.fetch(ordering).await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn count_players(&self) -> Result<u64, ScoreboardError> {
        self.repo.count().await
    }

    /// Delete the players in `ids`; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_players(&self, ids: &BTreeSet<PlayerId>) -> Result<u64, ScoreboardError> {
        self.repo.delete(ids).await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_all_players(&self) -> Result<u64, ScoreboardError> {
        self.repo.delete_all().await
    }

    /// Randomly insert, delete, and rescore or regroup players in one transaction,
    /// seeding demo data first when the store is empty.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ScoreboardError> {
        let outcome = self
            .repo
            .apply_planned(DemoPlanner::refresh(&self.generator))
            .await?;
        tracing::info!(
            teams_inserted = outcome.teams_inserted,
            inserted = outcome.inserted,
            deleted = outcome.deleted,
            updated = outcome.updated,
            "refreshed demo players"
        );
        Ok(outcome)
    }

    /// Insert the demo batch of players only when there are none yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn create_if_empty(&self) -> Result<RefreshOutcome, ScoreboardError> {
        let outcome = self
            .repo
            .apply_planned(DemoPlanner::seed_if_empty(&self.generator))
            .await?;
        if outcome.is_empty() {
            tracing::debug!("players already present, nothing seeded");
        } else {
            tracing::info!(
                teams_inserted = outcome.teams_inserted,
                inserted = outcome.inserted,
                "seeded demo players"
            );
        }
        Ok(outcome)
    }

    /// Observe all players in the given order.
    ///
    /// The stream yields the current players right away, then again after
    /// every committed change that can affect them.
    pub fn observe_players(&self, ordering: PlayerOrdering) -> LiveQuery<Player> {
        let repo = Arc::clone(&self.repo);
        LiveQuery::spawn(
            self.changes.subscribe(),
            ordering.observed_tables(),
            move || {
                let repo = Arc::clone(&repo);
                async move { repo.fetch(ordering).await }
            },
        )
    }
}
