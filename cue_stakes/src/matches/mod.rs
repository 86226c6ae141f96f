//! Match module: the companion game state machine.
//!
//! A match is created atomically when its wager is accepted and moves
//! `waiting -> playing -> finished`, or is cancelled. Finishing a match
//! with a linked wager settles that wager in the same transaction; see
//! [`crate::settlement`].

pub mod models;

pub use models::{Match, MatchId, MatchStatus};
