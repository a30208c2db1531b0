//! Storage port — repository traits for persistence.
//!
//! Every write method runs in exactly one transaction. Implementations publish
//! a [`TableChange`](scoreboard_domain::table::TableChange) after committing a
//! transaction that changed rows, and nothing otherwise.

use std::collections::BTreeSet;
use std::future::Future;

use scoreboard_domain::error::ScoreboardError;
use scoreboard_domain::id::{PlayerId, TeamId};
use scoreboard_domain::ordering::PlayerOrdering;
use scoreboard_domain::player::Player;
use scoreboard_domain::team::Team;

/// Changes decided by a [`RefreshPlanner`] and applied in one transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshPlan {
    /// Unsaved players to insert.
    pub insert: Vec<Player>,
    /// Players to delete.
    pub delete: Vec<PlayerId>,
    /// Saved players whose new field values must be written.
    pub update: Vec<Player>,
}

impl RefreshPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.delete.is_empty() && self.update.is_empty()
    }
}

/// Row counts affected by an applied plan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub teams_inserted: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
}

impl RefreshOutcome {
    /// Whether the transaction changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Decides what a planned write changes, given the rows read inside the
/// same transaction.
pub trait RefreshPlanner {
    /// Teams to insert before players are planned. `existing` holds every
    /// saved team.
    fn seed_teams(&mut self, existing: &[Team]) -> Vec<Team>;

    /// Player changes. `teams` holds every saved team, including the ones
    /// just seeded; `players` holds every saved player.
    fn plan(&mut self, teams: &[Team], players: &[Player]) -> RefreshPlan;
}

/// Repository for persisting and querying [`Player`]s.
pub trait PlayerRepository {
    /// Insert the player when it has no identity, capturing the assigned one,
    /// or update the row matching its identity.
    fn save(&self, player: Player) -> impl Future<Output = Result<Player, ScoreboardError>> + Send;

    /// [`PlayerRepository::save`] for several players in one transaction.
    fn save_all(
        &self,
        players: Vec<Player>,
    ) -> impl Future<Output = Result<Vec<Player>, ScoreboardError>> + Send;

    /// Get a player by its identity.
    fn get_by_id(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<Option<Player>, ScoreboardError>> + Send;

    /// Read every player in the given order.
    fn fetch(
        &self,
        ordering: PlayerOrdering,
    ) -> impl Future<Output = Result<Vec<Player>, ScoreboardError>> + Send;

    fn count(&self) -> impl Future<Output = Result<u64, ScoreboardError>> + Send;

    /// Delete the players whose identity is in `ids`. Unknown identities are
    /// ignored. Returns the number of deleted rows.
    fn delete(
        &self,
        ids: &BTreeSet<PlayerId>,
    ) -> impl Future<Output = Result<u64, ScoreboardError>> + Send;

    /// Delete every player. Returns the number of deleted rows.
    fn delete_all(&self) -> impl Future<Output = Result<u64, ScoreboardError>> + Send;

    /// Read teams and players, let `planner` decide, and apply its decisions,
    /// all in one transaction.
    fn apply_planned<P: RefreshPlanner + Send>(
        &self,
        planner: P,
    ) -> impl Future<Output = Result<RefreshOutcome, ScoreboardError>> + Send;
}

/// Repository for persisting and querying [`Team`]s.
pub trait TeamRepository {
    /// Insert or update, as [`PlayerRepository::save`].
    fn save(&self, team: Team) -> impl Future<Output = Result<Team, ScoreboardError>> + Send;

    fn get_by_id(
        &self,
        id: TeamId,
    ) -> impl Future<Output = Result<Option<Team>, ScoreboardError>> + Send;

    /// Read every team ordered by name.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Team>, ScoreboardError>> + Send;

    fn count(&self) -> impl Future<Output = Result<u64, ScoreboardError>> + Send;

    /// Delete the teams whose identity is in `ids`, cascading to their
    /// players. Unknown identities are ignored.
    fn delete(
        &self,
        ids: &BTreeSet<TeamId>,
    ) -> impl Future<Output = Result<u64, ScoreboardError>> + Send;

    /// Delete every team, and with them every player.
    fn delete_all(&self) -> impl Future<Output = Result<u64, ScoreboardError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_empty_plan() {
        assert!(RefreshPlan::default().is_empty());
        let plan = RefreshPlan {
            delete: vec![PlayerId::from_row_id(1)],
            ..RefreshPlan::default()
        };
        assert!(!plan.is_empty());
    }

    #[test]
    fn should_report_empty_outcome() {
        assert!(RefreshOutcome::default().is_empty());
        let outcome = RefreshOutcome {
            updated: 2,
            ..RefreshOutcome::default()
        };
        assert!(!outcome.is_empty());
    }
}
