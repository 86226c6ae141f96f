//! Read-side models for wager listings and betting history.

use crate::ledger::AccountId;
use crate::wager::Wager;
use serde::{Deserialize, Serialize};

/// Outcome of a completed wager from one account's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerOutcome {
    Won,
    Lost,
}

/// One completed wager in an account's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub wager: Wager,
    pub outcome: WagerOutcome,
    /// Net result in minor units: `total_prize - stake` when won, `-stake` when lost
    pub profit: i64,
}

/// Aggregate win/loss statistics over a history window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_bets: usize,
    pub total_won: usize,
    pub total_lost: usize,
    /// Percentage of wagers won, rounded to one decimal
    pub win_rate: f64,
}

/// Betting history for one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingHistory {
    pub entries: Vec<HistoryEntry>,
    pub stats: HistoryStats,
}

impl BettingHistory {
    /// Build history entries and stats from completed wagers.
    pub fn build(account_id: AccountId, completed: Vec<Wager>) -> Self {
        let entries: Vec<HistoryEntry> = completed
            .into_iter()
            .map(|wager| {
                if wager.winner_id == Some(account_id) {
                    let profit = wager.total_prize - wager.stake;
                    HistoryEntry {
                        wager,
                        outcome: WagerOutcome::Won,
                        profit,
                    }
                } else {
                    let profit = -wager.stake;
                    HistoryEntry {
                        wager,
                        outcome: WagerOutcome::Lost,
                        profit,
                    }
                }
            })
            .collect();

        let total_bets = entries.len();
        let total_won = entries
            .iter()
            .filter(|e| e.outcome == WagerOutcome::Won)
            .count();
        let total_lost = total_bets - total_won;
        let win_rate = if total_bets == 0 {
            0.0
        } else {
            (total_won as f64 / total_bets as f64 * 1000.0).round() / 10.0
        };

        Self {
            entries,
            stats: HistoryStats {
                total_bets,
                total_won,
                total_lost,
                win_rate,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wager::WagerStatus;
    use chrono::Utc;

    fn completed_wager(id: i64, creator: i64, opponent: i64, winner: i64) -> Wager {
        Wager {
            id,
            creator_id: creator,
            opponent_id: Some(opponent),
            stake: 2_500,
            platform_fee: 250,
            total_prize: 4_750,
            status: WagerStatus::Completed,
            winner_id: Some(winner),
            created_at: Utc::now(),
            matched_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_history_profit_and_stats() {
        let history = BettingHistory::build(
            10,
            vec![
                completed_wager(1, 10, 20, 10),
                completed_wager(2, 20, 10, 20),
                completed_wager(3, 10, 30, 10),
            ],
        );

        assert_eq!(history.stats.total_bets, 3);
        assert_eq!(history.stats.total_won, 2);
        assert_eq!(history.stats.total_lost, 1);
        assert_eq!(history.stats.win_rate, 66.7);

        assert_eq!(history.entries[0].outcome, WagerOutcome::Won);
        assert_eq!(history.entries[0].profit, 2_250);
        assert_eq!(history.entries[1].outcome, WagerOutcome::Lost);
        assert_eq!(history.entries[1].profit, -2_500);
    }

    #[test]
    fn test_empty_history() {
        let history = BettingHistory::build(10, vec![]);
        assert_eq!(history.stats.total_bets, 0);
        assert_eq!(history.stats.win_rate, 0.0);
    }
}
