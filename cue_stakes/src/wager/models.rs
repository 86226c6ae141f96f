//! Wager data models and pure state machine rules.

use crate::ledger::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wager ID type
pub type WagerId = i64;

/// Platform fee taken from the pot, as a rational (numerator / denominator).
///
/// Applied once at wager creation; never recomputed afterwards.
pub const PLATFORM_FEE_NUMERATOR: i64 = 5;
pub const PLATFORM_FEE_DENOMINATOR: i64 = 100;

/// Wager lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    /// Created, creator's stake in escrow, waiting for an opponent
    Open,
    /// Opponent joined, both stakes in escrow, match in progress
    Matched,
    /// Settled, winner paid
    Completed,
    /// Cancelled, stakes returned
    Cancelled,
}

impl WagerStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, WagerStatus::Completed | WagerStatus::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: WagerStatus) -> bool {
        matches!(
            (self, next),
            (WagerStatus::Open, WagerStatus::Matched)
                | (WagerStatus::Matched, WagerStatus::Completed)
                | (WagerStatus::Open, WagerStatus::Cancelled)
                | (WagerStatus::Matched, WagerStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WagerStatus::Open => write!(f, "open"),
            WagerStatus::Matched => write!(f, "matched"),
            WagerStatus::Completed => write!(f, "completed"),
            WagerStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for WagerStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(WagerStatus::Open),
            "matched" => Ok(WagerStatus::Matched),
            "completed" => Ok(WagerStatus::Completed),
            "cancelled" => Ok(WagerStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Unknown status string in a stored row
#[derive(Debug, thiserror::Error)]
#[error("Unknown status: {0}")]
pub struct ParseStatusError(pub String);

/// Wager model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wager {
    pub id: WagerId,
    pub creator_id: AccountId,
    pub opponent_id: Option<AccountId>,
    /// Stake each player puts up, in minor units
    pub stake: i64,
    /// Fee retained by the platform, fixed at creation
    pub platform_fee: i64,
    /// Winner payout; `total_prize + platform_fee == 2 * stake` always
    pub total_prize: i64,
    pub status: WagerStatus,
    pub winner_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub matched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Wager {
    /// Whether `account_id` is the creator or the (joined) opponent.
    pub fn is_participant(&self, account_id: AccountId) -> bool {
        self.creator_id == account_id || self.opponent_id == Some(account_id)
    }

    /// A winner must be one of the two participants.
    pub fn is_valid_winner(&self, winner_id: AccountId) -> bool {
        self.opponent_id.is_some() && self.is_participant(winner_id)
    }
}

/// Stake, pot, fee and prize for one wager.
///
/// Integer arithmetic only: `total_prize` is defined as `total_pot -
/// platform_fee`, so the conservation identity holds exactly for every
/// stake, with no rounding drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub stake: i64,
    pub total_pot: i64,
    pub platform_fee: i64,
    pub total_prize: i64,
}

impl FeeBreakdown {
    /// Compute the fee breakdown for a stake (both players pay `stake`).
    pub fn for_stake(stake: i64) -> Self {
        let total_pot = stake * 2;
        let platform_fee = total_pot * PLATFORM_FEE_NUMERATOR / PLATFORM_FEE_DENOMINATOR;
        let total_prize = total_pot - platform_fee;

        Self {
            stake,
            total_pot,
            platform_fee,
            total_prize,
        }
    }
}

/// Configured stake bounds for new wagers.
#[derive(Debug, Clone, Copy)]
pub struct WagerLimits {
    /// Minimum stake in minor units
    pub min_stake: i64,
    /// Maximum stake in minor units
    pub max_stake: i64,
}

impl WagerLimits {
    /// Load bounds from `WAGER_MIN_STAKE` / `WAGER_MAX_STAKE`, defaulting
    /// to R$ 5.00 and R$ 500.00.
    pub fn from_env() -> Self {
        let min_stake = std::env::var("WAGER_MIN_STAKE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);
        let max_stake = std::env::var("WAGER_MAX_STAKE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50_000);

        Self {
            min_stake,
            max_stake,
        }
    }

    /// Whether a stake is positive and within bounds.
    pub fn allows(&self, stake: i64) -> bool {
        stake > 0 && stake >= self.min_stake && stake <= self.max_stake
    }
}

impl Default for WagerLimits {
    fn default() -> Self {
        Self {
            min_stake: 500,
            max_stake: 50_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fee_breakdown_scenario() {
        // stake R$ 25.00 -> fee R$ 2.50, prize R$ 47.50
        let fees = FeeBreakdown::for_stake(2_500);
        assert_eq!(fees.total_pot, 5_000);
        assert_eq!(fees.platform_fee, 250);
        assert_eq!(fees.total_prize, 4_750);
    }

    #[test]
    fn test_fee_breakdown_odd_stake_conserves_pot() {
        // 3.33 each: pot 666, fee truncates to 33, prize absorbs the rest
        let fees = FeeBreakdown::for_stake(333);
        assert_eq!(fees.platform_fee, 33);
        assert_eq!(fees.total_prize, 633);
        assert_eq!(fees.total_prize + fees.platform_fee, 2 * fees.stake);
    }

    proptest! {
        #[test]
        fn prop_prize_plus_fee_equals_pot(stake in 1i64..100_000_000) {
            let fees = FeeBreakdown::for_stake(stake);
            prop_assert_eq!(fees.total_prize + fees.platform_fee, 2 * stake);
            prop_assert!(fees.platform_fee >= 0);
            prop_assert!(fees.total_prize > 0);
        }
    }

    #[test]
    fn test_status_transitions() {
        use WagerStatus::*;

        assert!(Open.can_transition_to(Matched));
        assert!(Open.can_transition_to(Cancelled));
        assert!(Matched.can_transition_to(Completed));
        assert!(Matched.can_transition_to(Cancelled));

        assert!(!Open.can_transition_to(Completed));
        assert!(!Matched.can_transition_to(Open));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Matched));
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            WagerStatus::Open,
            WagerStatus::Matched,
            WagerStatus::Completed,
            WagerStatus::Cancelled,
        ] {
            let parsed: WagerStatus = status.to_string().parse().expect("known status");
            assert_eq!(parsed, status);
        }
        assert!("playing".parse::<WagerStatus>().is_err());
    }

    #[test]
    fn test_winner_validation() {
        let wager = Wager {
            id: 1,
            creator_id: 10,
            opponent_id: Some(20),
            stake: 2_500,
            platform_fee: 250,
            total_prize: 4_750,
            status: WagerStatus::Matched,
            winner_id: None,
            created_at: Utc::now(),
            matched_at: Some(Utc::now()),
            completed_at: None,
        };

        assert!(wager.is_valid_winner(10));
        assert!(wager.is_valid_winner(20));
        assert!(!wager.is_valid_winner(30));

        let unmatched = Wager {
            opponent_id: None,
            status: WagerStatus::Open,
            matched_at: None,
            ..wager
        };
        // Nobody can win an unmatched wager, not even the creator
        assert!(!unmatched.is_valid_winner(10));
    }

    #[test]
    fn test_limits() {
        let limits = WagerLimits::default();
        assert!(!limits.allows(0));
        assert!(!limits.allows(-500));
        assert!(!limits.allows(499));
        assert!(limits.allows(500));
        assert!(limits.allows(50_000));
        assert!(!limits.allows(50_001));
    }
}
