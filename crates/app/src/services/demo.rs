//! Demo data — random players and teams, and the planner behind the demo
//! `refresh` and `create_if_empty` operations.

use scoreboard_domain::id::TeamId;
use scoreboard_domain::player::Player;
use scoreboard_domain::team::Team;

use crate::ports::{DataGenerator, RefreshPlan, RefreshPlanner};

/// Players inserted when the player table is found empty.
pub const DEMO_PLAYER_COUNT: usize = 8;

/// Teams inserted when the team table is found empty.
pub const DEMO_TEAM_COUNT: usize = 4;

/// An unsaved team with random fields.
pub fn random_team<G: DataGenerator + ?Sized>(generator: &G) -> Team {
    Team {
        id: None,
        name: generator.team_name(),
        first_team_date: generator.team_date(),
    }
}

/// An unsaved player with random fields, playing for one of `team_ids`.
///
/// Returns `None` when there is no team to play for.
pub fn random_player<G: DataGenerator + ?Sized>(
    generator: &G,
    team_ids: &[TeamId],
) -> Option<Player> {
    if team_ids.is_empty() {
        return None;
    }
    Some(Player {
        id: None,
        name: generator.player_name(),
        score: generator.score(),
        team_id: Some(team_ids[generator.index(team_ids.len())]),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Refresh,
    SeedIfEmpty,
}

/// Plans demo writes from a [`DataGenerator`].
///
/// Both modes seed [`DEMO_TEAM_COUNT`] teams when there are none and
/// [`DEMO_PLAYER_COUNT`] players when there are none. Only the refresh mode
/// then goes on to shuffle existing data with independent 50% odds: insert
/// one player, delete one player, and per remaining player give a new score
/// and move to a random team.
pub struct DemoPlanner<'g, G: ?Sized> {
    generator: &'g G,
    mode: Mode,
}

impl<'g, G: DataGenerator + ?Sized> DemoPlanner<'g, G> {
    #[must_use]
    pub fn refresh(generator: &'g G) -> Self {
        Self {
            generator,
            mode: Mode::Refresh,
        }
    }

    #[must_use]
    pub fn seed_if_empty(generator: &'g G) -> Self {
        Self {
            generator,
            mode: Mode::SeedIfEmpty,
        }
    }

    fn shuffle(&self, team_ids: &[TeamId], players: &[Player]) -> RefreshPlan {
        let generator = self.generator;
        let mut plan = RefreshPlan::default();

        if generator.coin_flip() {
            plan.insert.extend(random_player(generator, team_ids));
        }

        let deleted = if generator.coin_flip() {
            players[generator.index(players.len())].id
        } else {
            None
        };
        plan.delete.extend(deleted);

        for player in players {
            if deleted.is_some() && player.id == deleted {
                continue;
            }
            let mut updated = player.clone();
            if generator.coin_flip() {
                updated.score = generator.score();
            }
            if generator.coin_flip() {
                updated.team_id = Some(team_ids[generator.index(team_ids.len())]);
            }
            if updated != *player {
                plan.update.push(updated);
            }
        }

        plan
    }
}

impl<G: DataGenerator + ?Sized> RefreshPlanner for DemoPlanner<'_, G> {
    fn seed_teams(&mut self, existing: &[Team]) -> Vec<Team> {
        if !existing.is_empty() {
            return Vec::new();
        }
        (0..DEMO_TEAM_COUNT)
            .map(|_| random_team(self.generator))
            .collect()
    }

    fn plan(&mut self, teams: &[Team], players: &[Player]) -> RefreshPlan {
        let team_ids: Vec<TeamId> = teams.iter().filter_map(|team| team.id).collect();
        if team_ids.is_empty() {
            return RefreshPlan::default();
        }

        if players.is_empty() {
            return RefreshPlan {
                insert: (0..DEMO_PLAYER_COUNT)
                    .filter_map(|_| random_player(self.generator, &team_ids))
                    .collect(),
                ..RefreshPlan::default()
            };
        }

        match self.mode {
            Mode::SeedIfEmpty => RefreshPlan::default(),
            Mode::Refresh => self.shuffle(&team_ids, players),
        }
    }
}
