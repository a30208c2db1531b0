//! # scoreboard-domain
//!
//! Pure domain model for the scoreboard demo.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, dates
//! - Define **Players** (named scorers, each belonging to a team)
//! - Define **Teams** (named groups of players)
//! - Define **Orderings** (the named sort orders players can be read in)
//! - Define **Tables** and change notifications consumed by live queries
//! - Own the collation used to compare and sort name-like text
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod collation;
pub mod error;
pub mod id;
pub mod time;

pub mod ordering;
pub mod player;
pub mod table;
pub mod team;
