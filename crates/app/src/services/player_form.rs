//! Player form — view-model behind a player editing sheet.
//!
//! The form keeps the player it was opened with and the values typed so far.
//! Submitting validates the typed values, applies them, and saves.

use scoreboard_domain::error::{ScoreboardError, ValidationError};
use scoreboard_domain::id::TeamId;
use scoreboard_domain::player::Player;

use crate::ports::{ChangeSubscriber, DataGenerator, PlayerRepository};
use crate::services::player_service::PlayerService;

/// Editable copy of a [`Player`].
#[derive(Debug, Clone, Default)]
pub struct PlayerForm {
    original: Player,
    pub name: String,
    pub score: i64,
    pub team_id: Option<TeamId>,
}

impl PlayerForm {
    /// Open the form on `player`, new or saved.
    #[must_use]
    pub fn new(player: Player) -> Self {
        let mut form = Self::default();
        form.edit(player);
        form
    }

    /// The player as it was when the form was opened or last saved.
    #[must_use]
    pub fn original(&self) -> &Player {
        &self.original
    }

    /// Whether the typed values differ from the original player.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.name != self.original.name
            || self.score != self.original.score
            || self.team_id != self.original.team_id
    }

    /// Switch to editing `player`, discarding typed values.
    pub fn edit(&mut self, player: Player) {
        self.original = player;
        self.reset();
    }

    /// Switch to a new blank player, optionally preselecting a team.
    pub fn edit_new(&mut self, team_id: Option<TeamId>) {
        self.edit(Player {
            team_id,
            ..Player::new()
        });
    }

    /// Restore the typed values from the original player.
    pub fn reset(&mut self) {
        self.name.clone_from(&self.original.name);
        self.score = self.original.score;
        self.team_id = self.original.team_id;
    }

    /// Check the typed values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingName`] when the name is blank, or
    /// [`ValidationError::MissingTeam`] when no team is chosen.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.team_id.is_none() {
            return Err(ValidationError::MissingTeam);
        }
        Ok(())
    }

    /// Validate, apply the typed values, and save.
    ///
    /// On success the saved player becomes the new original. On failure the
    /// typed values and the original are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Validation`] before any store access when
    /// the typed values are invalid, or a storage error from the service.
    pub async fn submit<R, S, G>(
        &mut self,
        players: &PlayerService<R, S, G>,
    ) -> Result<Player, ScoreboardError>
    where
        R: PlayerRepository + Send + Sync + 'static,
        S: ChangeSubscriber,
        G: DataGenerator + Sync,
    {
        self.validate()?;
        let player = Player {
            id: self.original.id,
            name: self.name.trim().to_string(),
            score: self.score,
            team_id: self.team_id,
        };
        let saved = players.save_player(player).await?;
        self.edit(saved.clone());
        Ok(saved)
    }
}
