//! Text and JSON renderings of a scoreboard delivery.

use std::collections::HashMap;

use serde::Serialize;

use scoreboard_domain::id::TeamId;
use scoreboard_domain::ordering::PlayerOrdering;
use scoreboard_domain::player::Player;
use scoreboard_domain::team::Team;

/// One delivery as printed in JSON mode.
#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    ordering: PlayerOrdering,
    players: Vec<Row<'a>>,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    player: &'a Player,
    team_name: Option<&'a str>,
}

fn team_names(teams: &[Team]) -> HashMap<TeamId, &str> {
    teams
        .iter()
        .filter_map(|team| Some((team.id?, team.name.as_str())))
        .collect()
}

/// Render players as an aligned table, one line per player.
#[must_use]
pub fn table(ordering: PlayerOrdering, players: &[Player], teams: &[Team]) -> String {
    let names = team_names(teams);
    let mut out = format!("-- {} players by {ordering} --\n", players.len());
    for (rank, player) in players.iter().enumerate() {
        let team = player
            .team_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or("-");
        out.push_str(&format!(
            "{:>3}. {:<20} {:>5}  {team}\n",
            rank + 1,
            player.name,
            player.score
        ));
    }
    out
}

/// Render players as a single JSON line.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn json_line(
    ordering: PlayerOrdering,
    players: &[Player],
    teams: &[Team],
) -> Result<String, serde_json::Error> {
    let names = team_names(teams);
    let snapshot = Snapshot {
        ordering,
        players: players
            .iter()
            .map(|player| Row {
                player,
                team_name: player.team_id.and_then(|id| names.get(&id).copied()),
            })
            .collect(),
    };
    serde_json::to_string(&snapshot)
}
