//! Data generator port — random values used to build demo records.

use chrono::NaiveDate;

/// Source of random values for demo players and teams.
///
/// Implementations use interior mutability so a single generator can be
/// shared by a service and the planners it hands to repositories.
pub trait DataGenerator {
    fn player_name(&self) -> String;

    fn team_name(&self) -> String;

    /// A score for a freshly generated or mutated player.
    fn score(&self) -> i64;

    fn team_date(&self) -> NaiveDate;

    /// A fair coin flip.
    fn coin_flip(&self) -> bool;

    /// A uniformly chosen index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;
}
