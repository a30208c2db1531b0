//! Orderings players can be read in.
//!
//! Storage adapters translate each variant into an `ORDER BY` clause; the
//! in-memory [`PlayerOrdering::sort`] mirrors the same rules.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::collation::localized_case_insensitive;
use crate::player::Player;
use crate::table::{Table, TableSet};

/// A named sort order for players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerOrdering {
    /// Name ascending, case-insensitive.
    #[serde(alias = "name")]
    ByName,
    /// Score descending, then name ascending.
    #[default]
    #[serde(alias = "score")]
    ByScore,
    /// Team name ascending, then score descending, then name ascending.
    #[serde(alias = "team")]
    ByTeamName,
}

impl PlayerOrdering {
    pub const ALL: [Self; 3] = [Self::ByName, Self::ByScore, Self::ByTeamName];

    /// Tables whose changes can alter the result of a read in this order.
    #[must_use]
    pub const fn observed_tables(self) -> TableSet {
        match self {
            Self::ByName | Self::ByScore => TableSet::single(Table::Player),
            Self::ByTeamName => TableSet::single(Table::Player).with(Table::Team),
        }
    }

    /// Sort `players` in place. `team_name` resolves a player's team name and
    /// is only consulted for [`PlayerOrdering::ByTeamName`].
    ///
    /// Remaining ties are broken by identity so the result is deterministic.
    pub fn sort<'a, F>(self, players: &mut [Player], team_name: F)
    where
        F: Fn(&Player) -> &'a str,
    {
        players.sort_by(|a, b| {
            let primary = match self {
                Self::ByName => Ordering::Equal,
                Self::ByScore => b.score.cmp(&a.score),
                Self::ByTeamName => localized_case_insensitive(team_name(a), team_name(b))
                    .then_with(|| b.score.cmp(&a.score)),
            };
            primary
                .then_with(|| localized_case_insensitive(&a.name, &b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

impl fmt::Display for PlayerOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ByName => "name",
            Self::ByScore => "score",
            Self::ByTeamName => "team",
        })
    }
}

/// Returned when parsing an unknown ordering name.
#[derive(Debug, thiserror::Error)]
#[error("unknown player ordering {0:?}, expected one of: name, score, team")]
pub struct UnknownOrdering(pub String);

impl FromStr for PlayerOrdering {
    type Err = UnknownOrdering;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "by_name" => Ok(Self::ByName),
            "score" | "by_score" => Ok(Self::ByScore),
            "team" | "by_team_name" => Ok(Self::ByTeamName),
            other => Err(UnknownOrdering(other.to_string())),
        }
    }
}
