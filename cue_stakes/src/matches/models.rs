//! Match data models and state rules.

use crate::ledger::AccountId;
use crate::wager::ParseStatusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Match ID type
pub type MatchId = i64;

/// Match lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Created alongside a matched wager, waiting for play to begin
    Waiting,
    /// Play in progress
    Playing,
    /// Outcome recorded
    Finished,
    /// Abandoned before an outcome
    Cancelled,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Waiting, MatchStatus::Playing)
                | (MatchStatus::Playing, MatchStatus::Finished)
                | (MatchStatus::Waiting, MatchStatus::Cancelled)
                | (MatchStatus::Playing, MatchStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Waiting => write!(f, "waiting"),
            MatchStatus::Playing => write!(f, "playing"),
            MatchStatus::Finished => write!(f, "finished"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(MatchStatus::Waiting),
            "playing" => Ok(MatchStatus::Playing),
            "finished" => Ok(MatchStatus::Finished),
            "cancelled" => Ok(MatchStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Match model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub player_a_id: AccountId,
    pub player_b_id: AccountId,
    pub status: MatchStatus,
    pub winner_id: Option<AccountId>,
    pub wager_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Whether `account_id` is one of the two players.
    pub fn has_player(&self, account_id: AccountId) -> bool {
        self.player_a_id == account_id || self.player_b_id == account_id
    }

    /// Seconds between start and finish, when both are stamped.
    pub fn duration_secs(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some((finished - started).num_seconds()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use MatchStatus::*;

        assert!(Waiting.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Finished));
        assert!(Waiting.can_transition_to(Cancelled));
        assert!(Playing.can_transition_to(Cancelled));

        assert!(!Waiting.can_transition_to(Finished));
        assert!(!Finished.can_transition_to(Playing));
        assert!(!Cancelled.can_transition_to(Playing));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            MatchStatus::Waiting,
            MatchStatus::Playing,
            MatchStatus::Finished,
            MatchStatus::Cancelled,
        ] {
            let parsed: MatchStatus = status.to_string().parse().expect("known status");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_players_and_duration() {
        let started = Utc::now();
        let game = Match {
            id: 1,
            player_a_id: 10,
            player_b_id: 20,
            status: MatchStatus::Finished,
            winner_id: Some(20),
            wager_id: Some(7),
            started_at: Some(started),
            finished_at: Some(started + chrono::Duration::seconds(95)),
            created_at: started,
        };

        assert!(game.has_player(10));
        assert!(game.has_player(20));
        assert!(!game.has_player(30));
        assert_eq!(game.duration_secs(), Some(95));
    }
}
