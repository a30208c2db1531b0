//! Player — a named scorer belonging to a team.

use serde::{Deserialize, Serialize};

use crate::error::{ScoreboardError, ValidationError};
use crate::id::{PlayerId, TeamId};

/// A player. `id` is `None` until the player is first saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Option<PlayerId>,
    pub name: String,
    pub score: i64,
    pub team_id: Option<TeamId>,
}

impl Player {
    /// A blank, unsaved player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a [`Player`].
    #[must_use]
    pub fn builder() -> PlayerBuilder {
        PlayerBuilder::default()
    }

    /// Whether this player has been persisted and carries an identity.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Check domain invariants required before persisting.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingName`] when `name` is blank, or
    /// [`ValidationError::MissingTeam`] when no team is set.
    pub fn validate(&self) -> Result<(), ScoreboardError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        if self.team_id.is_none() {
            return Err(ValidationError::MissingTeam.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Player`].
#[derive(Debug, Default)]
pub struct PlayerBuilder {
    id: Option<PlayerId>,
    name: Option<String>,
    score: i64,
    team_id: Option<TeamId>,
}

impl PlayerBuilder {
    #[must_use]
    pub fn id(mut self, id: PlayerId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    #[must_use]
    pub fn team_id(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Consume the builder, validate, and return a [`Player`].
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Validation`] if the name is missing or no
    /// team was given.
    pub fn build(self) -> Result<Player, ScoreboardError> {
        let player = Player {
            id: self.id,
            name: self.name.unwrap_or_default(),
            score: self.score,
            team_id: self.team_id,
        };
        player.validate()?;
        Ok(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_player_when_name_and_team_provided() {
        let player = Player::builder()
            .name("Arthur")
            .score(120)
            .team_id(TeamId::from_row_id(1))
            .build()
            .unwrap();
        assert_eq!(player.name, "Arthur");
        assert_eq!(player.score, 120);
        assert!(!player.is_persisted());
    }

    #[test]
    fn should_return_missing_name_when_name_is_blank() {
        let result = Player::builder()
            .name("   ")
            .team_id(TeamId::from_row_id(1))
            .build();
        assert!(matches!(
            result,
            Err(ScoreboardError::Validation(ValidationError::MissingName))
        ));
    }

    #[test]
    fn should_return_missing_team_when_team_absent() {
        let result = Player::builder().name("Barbara").build();
        assert!(matches!(
            result,
            Err(ScoreboardError::Validation(ValidationError::MissingTeam))
        ));
    }

    #[test]
    fn should_start_blank_and_transient() {
        let player = Player::new();
        assert!(player.id.is_none());
        assert!(player.name.is_empty());
        assert_eq!(player.score, 0);
        assert!(player.team_id.is_none());
    }
}
