//! Team — a named group of players.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ScoreboardError, ValidationError};
use crate::id::TeamId;
use crate::time::today;

/// A team. `id` is `None` until the team is first saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<TeamId>,
    pub name: String,
    pub first_team_date: NaiveDate,
}

impl Default for Team {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            first_team_date: today(),
        }
    }
}

impl Team {
    /// A blank, unsaved team dated today.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a [`Team`].
    #[must_use]
    pub fn builder() -> TeamBuilder {
        TeamBuilder::default()
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Check domain invariants required before persisting.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingTeamName`] when `name` is blank.
    pub fn validate(&self) -> Result<(), ScoreboardError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingTeamName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Team`].
#[derive(Debug, Default)]
pub struct TeamBuilder {
    id: Option<TeamId>,
    name: Option<String>,
    first_team_date: Option<NaiveDate>,
}

impl TeamBuilder {
    #[must_use]
    pub fn id(mut self, id: TeamId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn first_team_date(mut self, date: NaiveDate) -> Self {
        self.first_team_date = Some(date);
        self
    }

    /// Consume the builder, validate, and return a [`Team`].
    ///
    /// The date defaults to today.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Validation`] if the name is missing.
    pub fn build(self) -> Result<Team, ScoreboardError> {
        let team = Team {
            id: self.id,
            name: self.name.unwrap_or_default(),
            first_team_date: self.first_team_date.unwrap_or_else(today),
        };
        team.validate()?;
        Ok(team)
    }
}
