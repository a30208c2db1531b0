//! # scoreboard-adapter-random
//!
//! Random demo data behind the [`DataGenerator`] port.
//!
//! Names are drawn from configurable pools, scores are multiples of 10
//! between 0 and 1000, and team dates fall within the last century.
//!
//! ## Dependency rule
//!
//! Depends on `scoreboard-app` (port traits) only.

use chrono::{Days, NaiveDate};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use scoreboard_app::ports::DataGenerator;

/// Player names used when no pool is configured.
pub const DEFAULT_PLAYER_NAMES: &[&str] = &[
    "Arthur", "Anita", "Barbara", "Bernard", "Craig", "Chiara", "David", "Dean", "Éric", "Elena",
    "Fatima", "Frederic", "Gilbert", "Georgette", "Henriette", "Hassan", "Ignacio", "Irene",
    "Julie", "Jack", "Karl", "Kristel", "Louis", "Liz", "Masashi", "Mary", "Noam", "Nicolas",
    "Ophelie", "Oleg", "Pascal", "Patricia", "Quentin", "Quinn", "Raoul", "Rachel", "Stephan",
    "Susie", "Tristan", "Tatiana", "Ursule", "Urbain", "Victor", "Violette", "Wilfried",
    "Wilhelmina", "Yvon", "Yann", "Zazie", "Zoé",
];

/// Team names used when no pool is configured.
pub const DEFAULT_TEAM_NAMES: &[&str] = &[
    "Red", "Blue", "Green", "Yellow", "Orange", "Purple", "Crimson", "Teal", "Indigo", "Silver",
];

/// Earliest date a generated team can have been founded.
const FIRST_TEAM_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1920, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Span of generated team dates, in days.
const TEAM_DATE_SPAN_DAYS: u64 = 100 * 365;

/// Generated scores are `SCORE_STEP * n` for `n` in `0..=MAX_SCORE_STEPS`.
const SCORE_STEP: i64 = 10;
const MAX_SCORE_STEPS: i64 = 100;

/// [`DataGenerator`] backed by a seedable RNG.
pub struct RandomDataGenerator {
    rng: Mutex<StdRng>,
    player_names: Vec<String>,
    team_names: Vec<String>,
}

impl Default for RandomDataGenerator {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl RandomDataGenerator {
    /// Create a generator drawing from `rng` with the built-in name pools.
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            player_names: owned(DEFAULT_PLAYER_NAMES),
            team_names: owned(DEFAULT_TEAM_NAMES),
        }
    }

    /// Create a reproducible generator.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Replace the player name pool. An empty pool keeps the current one.
    #[must_use]
    pub fn with_player_names(mut self, names: Vec<String>) -> Self {
        if !names.is_empty() {
            self.player_names = names;
        }
        self
    }

    /// Replace the team name pool. An empty pool keeps the current one.
    #[must_use]
    pub fn with_team_names(mut self, names: Vec<String>) -> Self {
        if !names.is_empty() {
            self.team_names = names;
        }
        self
    }

    fn pick(&self, pool: &[String]) -> String {
        pool.choose(&mut *self.rng.lock())
            .cloned()
            .unwrap_or_default()
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

impl DataGenerator for RandomDataGenerator {
    fn player_name(&self) -> String {
        self.pick(&self.player_names)
    }

    fn team_name(&self) -> String {
        self.pick(&self.team_names)
    }

    fn score(&self) -> i64 {
        SCORE_STEP * self.rng.lock().random_range(0..=MAX_SCORE_STEPS)
    }

    fn team_date(&self) -> NaiveDate {
        let offset = self.rng.lock().random_range(0..=TEAM_DATE_SPAN_DAYS);
        FIRST_TEAM_DATE
            .checked_add_days(Days::new(offset))
            .unwrap_or(FIRST_TEAM_DATE)
    }

    fn coin_flip(&self) -> bool {
        self.rng.lock().random_bool(0.5)
    }

    fn index(&self, len: usize) -> usize {
        self.rng.lock().random_range(0..len.max(1))
    }
}
