//! Wager module: the head-to-head stake state machine.
//!
//! A wager moves `open -> matched -> completed`, or is cancelled from
//! either non-terminal state. The models here are pure — validation rules,
//! fee arithmetic and transition tables — while all persistence and
//! multi-entity effects live in [`crate::settlement`].

pub mod models;

pub use models::{
    FeeBreakdown, PLATFORM_FEE_DENOMINATOR, PLATFORM_FEE_NUMERATOR, ParseStatusError, Wager,
    WagerId, WagerLimits, WagerStatus,
};
