//! Settlement coordinator: every cross-entity transition in one transaction.
//!
//! This is the only component allowed to mutate more than one entity per
//! operation. Each state-changing call opens a single Postgres transaction,
//! locks the wager row (wagers before matches, to keep lock order
//! consistent), funnels all balance moves through [`LedgerManager::record`],
//! and commits everything together — a failure anywhere rolls the whole
//! attempt back with no partial effect.

use super::{
    errors::{SettlementError, SettlementResult},
    models::BettingHistory,
};
use crate::db::PLATFORM_ACCOUNT_ID;
use crate::ledger::{AccountId, EntryKind, EntryRefs, LedgerManager};
use crate::matches::{Match, MatchId, MatchStatus};
use crate::wager::{FeeBreakdown, Wager, WagerId, WagerLimits, WagerStatus};
use log::info;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

const MAX_LIST_LIMIT: i64 = 50;

/// Settlement manager
#[derive(Clone)]
pub struct SettlementManager {
    pool: Arc<PgPool>,
    limits: WagerLimits,
}

impl SettlementManager {
    /// Create a new settlement manager with stake bounds from the environment
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_limits(pool, WagerLimits::from_env())
    }

    /// Create a settlement manager with explicit stake bounds
    pub fn with_limits(pool: Arc<PgPool>, limits: WagerLimits) -> Self {
        Self { pool, limits }
    }

    /// Configured stake bounds
    pub fn limits(&self) -> WagerLimits {
        self.limits
    }

    /// Create a wager: hold the creator's stake in escrow and open the offer.
    ///
    /// The fee breakdown is computed once here and fixed for the wager's
    /// lifetime. The escrow debit and the wager row are committed together;
    /// if the creator cannot cover the stake nothing is persisted.
    ///
    /// # Errors
    ///
    /// * `SettlementError::InvalidAmount` - Stake outside configured bounds
    /// * `SettlementError::AccountNotFound` - Unknown creator
    /// * `SettlementError::InsufficientFunds` - Creator cannot cover the stake
    pub async fn create_wager(
        &self,
        creator_id: AccountId,
        stake: i64,
    ) -> SettlementResult<Wager> {
        if !self.limits.allows(stake) {
            return Err(SettlementError::InvalidAmount {
                amount: stake,
                min: self.limits.min_stake,
                max: self.limits.max_stake,
            });
        }

        let fees = FeeBreakdown::for_stake(stake);
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM accounts WHERE id = $1")
            .bind(creator_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(SettlementError::AccountNotFound(creator_id))?;

        let row = sqlx::query(
            r#"
            INSERT INTO wagers (creator_id, stake, platform_fee, total_prize, status)
            VALUES ($1, $2, $3, $4, 'open')
            RETURNING id, created_at
            "#,
        )
        .bind(creator_id)
        .bind(stake)
        .bind(fees.platform_fee)
        .bind(fees.total_prize)
        .fetch_one(&mut *tx)
        .await?;

        let wager_id: WagerId = row.get("id");

        LedgerManager::record(
            &mut tx,
            creator_id,
            -stake,
            EntryKind::EscrowHold,
            EntryRefs::wager(wager_id),
            &format!("escrow_hold_w{wager_id}_a{creator_id}"),
            Some(format!("Stake held for wager {wager_id}")),
        )
        .await?;

        tx.commit().await?;

        info!("Wager {wager_id} opened by account {creator_id} for {stake}");

        Ok(Wager {
            id: wager_id,
            creator_id,
            opponent_id: None,
            stake,
            platform_fee: fees.platform_fee,
            total_prize: fees.total_prize,
            status: WagerStatus::Open,
            winner_id: None,
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            matched_at: None,
            completed_at: None,
        })
    }

    /// Accept an open wager: hold the opponent's stake and create the match.
    ///
    /// The wager row is locked for the duration, so of two concurrent
    /// accepts exactly one succeeds; the loser observes `matched` and gets
    /// `InvalidState`.
    ///
    /// # Errors
    ///
    /// * `SettlementError::WagerNotFound` - Unknown wager
    /// * `SettlementError::InvalidState` - Wager is not `open`
    /// * `SettlementError::SelfMatch` - Opponent is the creator
    /// * `SettlementError::InsufficientFunds` - Opponent cannot cover the stake
    pub async fn accept_wager(
        &self,
        wager_id: WagerId,
        opponent_id: AccountId,
    ) -> SettlementResult<(Wager, Match)> {
        let mut tx = self.pool.begin().await?;

        let mut wager = lock_wager(&mut tx, wager_id).await?;

        if wager.status != WagerStatus::Open {
            return Err(invalid_state(WagerStatus::Open, wager.status));
        }
        if opponent_id == wager.creator_id {
            return Err(SettlementError::SelfMatch);
        }

        LedgerManager::record(
            &mut tx,
            opponent_id,
            -wager.stake,
            EntryKind::EscrowHold,
            EntryRefs::wager(wager_id),
            &format!("escrow_hold_w{wager_id}_a{opponent_id}"),
            Some(format!("Stake held for wager {wager_id}")),
        )
        .await?;

        let updated = sqlx::query(
            "UPDATE wagers
             SET opponent_id = $1, status = 'matched', matched_at = NOW()
             WHERE id = $2
             RETURNING matched_at",
        )
        .bind(opponent_id)
        .bind(wager_id)
        .fetch_one(&mut *tx)
        .await?;

        let match_row = sqlx::query(
            r#"
            INSERT INTO matches (player_a_id, player_b_id, status, wager_id)
            VALUES ($1, $2, 'waiting', $3)
            RETURNING id, created_at
            "#,
        )
        .bind(wager.creator_id)
        .bind(opponent_id)
        .bind(wager_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let match_id: MatchId = match_row.get("id");
        info!("Wager {wager_id} matched by account {opponent_id}, match {match_id} created");

        wager.opponent_id = Some(opponent_id);
        wager.status = WagerStatus::Matched;
        wager.matched_at = Some(
            updated
                .get::<chrono::NaiveDateTime, _>("matched_at")
                .and_utc(),
        );

        let game = Match {
            id: match_id,
            player_a_id: wager.creator_id,
            player_b_id: opponent_id,
            status: MatchStatus::Waiting,
            winner_id: None,
            wager_id: Some(wager_id),
            started_at: None,
            finished_at: None,
            created_at: match_row
                .get::<chrono::NaiveDateTime, _>("created_at")
                .and_utc(),
        };

        Ok((wager, game))
    }

    /// Start a match: `waiting -> playing`.
    ///
    /// Single conditional update; a concurrent start loses the race and
    /// gets `InvalidState`.
    pub async fn start_match(&self, match_id: MatchId) -> SettlementResult<Match> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE matches
             SET status = 'playing', started_at = NOW()
             WHERE id = $1 AND status = 'waiting'
             RETURNING id, player_a_id, player_b_id, status, winner_id, wager_id,
                       started_at, finished_at, created_at",
        )
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?;

        let game = match updated {
            Some(row) => match_from_row(&row)?,
            None => {
                let existing = sqlx::query("SELECT status FROM matches WHERE id = $1")
                    .bind(match_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                return match existing {
                    Some(row) => {
                        let actual: MatchStatus = parse_status(row.get("status"))?;
                        Err(invalid_state(MatchStatus::Waiting, actual))
                    }
                    None => Err(SettlementError::MatchNotFound(match_id)),
                };
            }
        };

        tx.commit().await?;
        info!("Match {match_id} started");
        Ok(game)
    }

    /// Record a match outcome and settle the linked wager atomically.
    ///
    /// Valid only while the match is `playing`. The winner credit, the
    /// platform fee entry, the wager completion and the match finish all
    /// commit together.
    ///
    /// # Errors
    ///
    /// * `SettlementError::MatchNotFound` - Unknown match
    /// * `SettlementError::InvalidState` - Match is not `playing`
    /// * `SettlementError::InvalidWinner` - Winner is not one of the players
    pub async fn report_match_result(
        &self,
        match_id: MatchId,
        winner_id: AccountId,
    ) -> SettlementResult<(Match, Option<Wager>)> {
        let mut tx = self.pool.begin().await?;

        // Peek at the match to learn the linked wager, then take locks in
        // the global order: wagers before matches.
        let peek = sqlx::query("SELECT wager_id FROM matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(SettlementError::MatchNotFound(match_id))?;
        let linked_wager: Option<WagerId> = peek.get("wager_id");

        let wager = match linked_wager {
            Some(wager_id) => Some(lock_wager(&mut tx, wager_id).await?),
            None => None,
        };

        let game = lock_match(&mut tx, match_id).await?;

        if game.status != MatchStatus::Playing {
            return Err(invalid_state(MatchStatus::Playing, game.status));
        }
        if !game.has_player(winner_id) {
            return Err(SettlementError::InvalidWinner(winner_id));
        }

        let finished = sqlx::query(
            "UPDATE matches
             SET status = 'finished', winner_id = $1, finished_at = NOW()
             WHERE id = $2
             RETURNING finished_at",
        )
        .bind(winner_id)
        .bind(match_id)
        .fetch_one(&mut *tx)
        .await?;

        let settled = match wager {
            Some(w) => {
                if w.status != WagerStatus::Matched {
                    return Err(invalid_state(WagerStatus::Matched, w.status));
                }
                if !w.is_valid_winner(winner_id) {
                    return Err(SettlementError::InvalidWinner(winner_id));
                }
                Some(settle_wager(&mut tx, w, Some(match_id), winner_id).await?)
            }
            None => None,
        };

        tx.commit().await?;

        info!("Match {match_id} finished, winner {winner_id}");

        let mut game = game;
        game.status = MatchStatus::Finished;
        game.winner_id = Some(winner_id);
        game.finished_at = Some(
            finished
                .get::<chrono::NaiveDateTime, _>("finished_at")
                .and_utc(),
        );

        Ok((game, settled))
    }

    /// Complete a wager directly by id: pay the winner and finish the match.
    ///
    /// The wager-driven twin of [`report_match_result`], used when the
    /// outcome arrives keyed by wager rather than by match. A linked match
    /// still `waiting` or `playing` is finished alongside.
    ///
    /// [`report_match_result`]: SettlementManager::report_match_result
    pub async fn complete_wager(
        &self,
        wager_id: WagerId,
        winner_id: AccountId,
    ) -> SettlementResult<Wager> {
        let mut tx = self.pool.begin().await?;

        let wager = lock_wager(&mut tx, wager_id).await?;

        if wager.status != WagerStatus::Matched {
            return Err(invalid_state(WagerStatus::Matched, wager.status));
        }
        if !wager.is_valid_winner(winner_id) {
            return Err(SettlementError::InvalidWinner(winner_id));
        }

        sqlx::query(
            "UPDATE matches
             SET status = 'finished', winner_id = $1, finished_at = NOW()
             WHERE wager_id = $2 AND status IN ('waiting', 'playing')",
        )
        .bind(winner_id)
        .bind(wager_id)
        .execute(&mut *tx)
        .await?;

        let settled = settle_wager(&mut tx, wager, None, winner_id).await?;

        tx.commit().await?;

        info!("Wager {wager_id} completed, winner {winner_id}");
        Ok(settled)
    }

    /// Cancel a wager and return every stake held for it.
    ///
    /// From `open` the creator's escrow is released; from `matched` both
    /// stakes are refunded and the linked match is cancelled. Terminal
    /// states reject with `InvalidState`.
    pub async fn cancel_wager(&self, wager_id: WagerId, reason: &str) -> SettlementResult<Wager> {
        let mut tx = self.pool.begin().await?;

        let mut wager = lock_wager(&mut tx, wager_id).await?;

        match wager.status {
            WagerStatus::Open => {
                LedgerManager::record(
                    &mut tx,
                    wager.creator_id,
                    wager.stake,
                    EntryKind::EscrowRelease,
                    EntryRefs::wager(wager_id),
                    &format!("escrow_release_w{wager_id}_a{}", wager.creator_id),
                    Some(reason.to_string()),
                )
                .await?;
            }
            WagerStatus::Matched => {
                let opponent_id = wager
                    .opponent_id
                    .ok_or(SettlementError::WagerNotFound(wager_id))?;

                for account_id in [wager.creator_id, opponent_id] {
                    LedgerManager::record(
                        &mut tx,
                        account_id,
                        wager.stake,
                        EntryKind::BetRefund,
                        EntryRefs::wager(wager_id),
                        &format!("bet_refund_w{wager_id}_a{account_id}"),
                        Some(reason.to_string()),
                    )
                    .await?;
                }

                sqlx::query(
                    "UPDATE matches
                     SET status = 'cancelled'
                     WHERE wager_id = $1 AND status IN ('waiting', 'playing')",
                )
                .bind(wager_id)
                .execute(&mut *tx)
                .await?;
            }
            status => {
                return Err(SettlementError::InvalidState {
                    expected: "open or matched".to_string(),
                    actual: status.to_string(),
                });
            }
        }

        sqlx::query("UPDATE wagers SET status = 'cancelled' WHERE id = $1")
            .bind(wager_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Wager {wager_id} cancelled: {reason}");

        wager.status = WagerStatus::Cancelled;
        Ok(wager)
    }

    /// Get a wager by id
    pub async fn get_wager(&self, wager_id: WagerId) -> SettlementResult<Wager> {
        let row = sqlx::query(
            "SELECT id, creator_id, opponent_id, stake, platform_fee, total_prize,
                    status, winner_id, created_at, matched_at, completed_at
             FROM wagers WHERE id = $1",
        )
        .bind(wager_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(SettlementError::WagerNotFound(wager_id))?;

        wager_from_row(&row)
    }

    /// Get a match by id
    pub async fn get_match(&self, match_id: MatchId) -> SettlementResult<Match> {
        let row = sqlx::query(
            "SELECT id, player_a_id, player_b_id, status, winner_id, wager_id,
                    started_at, finished_at, created_at
             FROM matches WHERE id = $1",
        )
        .bind(match_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(SettlementError::MatchNotFound(match_id))?;

        match_from_row(&row)
    }

    /// List open wagers, newest first. `limit` is capped at 50.
    pub async fn list_open_wagers(&self, limit: i64) -> SettlementResult<Vec<Wager>> {
        let rows = sqlx::query(
            "SELECT id, creator_id, opponent_id, stake, platform_fee, total_prize,
                    status, winner_id, created_at, matched_at, completed_at
             FROM wagers
             WHERE status = 'open'
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit.clamp(1, MAX_LIST_LIMIT))
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(wager_from_row).collect()
    }

    /// All wagers an account created or accepted, newest first
    pub async fn wagers_for_account(&self, account_id: AccountId) -> SettlementResult<Vec<Wager>> {
        let rows = sqlx::query(
            "SELECT id, creator_id, opponent_id, stake, platform_fee, total_prize,
                    status, winner_id, created_at, matched_at, completed_at
             FROM wagers
             WHERE creator_id = $1 OR opponent_id = $1
             ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(wager_from_row).collect()
    }

    /// Completed-wager history with win/loss stats. `limit` is capped at 50.
    pub async fn betting_history(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> SettlementResult<BettingHistory> {
        let rows = sqlx::query(
            "SELECT id, creator_id, opponent_id, stake, platform_fee, total_prize,
                    status, winner_id, created_at, matched_at, completed_at
             FROM wagers
             WHERE (creator_id = $1 OR opponent_id = $1) AND status = 'completed'
             ORDER BY completed_at DESC
             LIMIT $2",
        )
        .bind(account_id)
        .bind(limit.clamp(1, MAX_LIST_LIMIT))
        .fetch_all(self.pool.as_ref())
        .await?;

        let completed: SettlementResult<Vec<Wager>> = rows.iter().map(wager_from_row).collect();
        Ok(BettingHistory::build(account_id, completed?))
    }
}

/// Pay out a matched wager inside an open transaction.
///
/// Credits the winner with the prize and the platform account with the fee,
/// then marks the wager completed. The caller has already validated the
/// state and the winner and holds the wager row lock.
async fn settle_wager(
    tx: &mut Transaction<'_, Postgres>,
    mut wager: Wager,
    match_id: Option<MatchId>,
    winner_id: AccountId,
) -> SettlementResult<Wager> {
    let refs = match match_id {
        Some(mid) => EntryRefs::wager_and_match(wager.id, mid),
        None => EntryRefs::wager(wager.id),
    };

    LedgerManager::record(
        tx,
        winner_id,
        wager.total_prize,
        EntryKind::BetWin,
        refs,
        &format!("bet_win_w{}", wager.id),
        Some(format!("Prize for wager {}", wager.id)),
    )
    .await?;

    if wager.platform_fee > 0 {
        LedgerManager::record(
            tx,
            PLATFORM_ACCOUNT_ID,
            wager.platform_fee,
            EntryKind::PlatformFee,
            refs,
            &format!("platform_fee_w{}", wager.id),
            Some(format!("Fee retained for wager {}", wager.id)),
        )
        .await?;
    }

    let updated = sqlx::query(
        "UPDATE wagers
         SET winner_id = $1, status = 'completed', completed_at = NOW()
         WHERE id = $2
         RETURNING completed_at",
    )
    .bind(winner_id)
    .bind(wager.id)
    .fetch_one(&mut **tx)
    .await?;

    wager.winner_id = Some(winner_id);
    wager.status = WagerStatus::Completed;
    wager.completed_at = Some(
        updated
            .get::<chrono::NaiveDateTime, _>("completed_at")
            .and_utc(),
    );

    Ok(wager)
}

/// Fetch a wager under `FOR UPDATE`, serializing concurrent transitions.
async fn lock_wager(
    tx: &mut Transaction<'_, Postgres>,
    wager_id: WagerId,
) -> SettlementResult<Wager> {
    let row = sqlx::query(
        "SELECT id, creator_id, opponent_id, stake, platform_fee, total_prize,
                status, winner_id, created_at, matched_at, completed_at
         FROM wagers WHERE id = $1
         FOR UPDATE",
    )
    .bind(wager_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(SettlementError::WagerNotFound(wager_id))?;

    wager_from_row(&row)
}

/// Fetch a match under `FOR UPDATE`. Lock wagers first (see module docs).
async fn lock_match(
    tx: &mut Transaction<'_, Postgres>,
    match_id: MatchId,
) -> SettlementResult<Match> {
    let row = sqlx::query(
        "SELECT id, player_a_id, player_b_id, status, winner_id, wager_id,
                started_at, finished_at, created_at
         FROM matches WHERE id = $1
         FOR UPDATE",
    )
    .bind(match_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(SettlementError::MatchNotFound(match_id))?;

    match_from_row(&row)
}

fn invalid_state(expected: impl std::fmt::Display, actual: impl std::fmt::Display) -> SettlementError {
    SettlementError::InvalidState {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn parse_status<T>(raw: String) -> SettlementResult<T>
where
    T: std::str::FromStr<Err = crate::wager::ParseStatusError>,
{
    raw.parse()
        .map_err(|e: crate::wager::ParseStatusError| {
            SettlementError::Database(sqlx::Error::Decode(Box::new(e)))
        })
}

fn wager_from_row(row: &PgRow) -> SettlementResult<Wager> {
    Ok(Wager {
        id: row.get("id"),
        creator_id: row.get("creator_id"),
        opponent_id: row.get("opponent_id"),
        stake: row.get("stake"),
        platform_fee: row.get("platform_fee"),
        total_prize: row.get("total_prize"),
        status: parse_status(row.get::<String, _>("status"))?,
        winner_id: row.get("winner_id"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        matched_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("matched_at")
            .map(|t| t.and_utc()),
        completed_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("completed_at")
            .map(|t| t.and_utc()),
    })
}

fn match_from_row(row: &PgRow) -> SettlementResult<Match> {
    Ok(Match {
        id: row.get("id"),
        player_a_id: row.get("player_a_id"),
        player_b_id: row.get("player_b_id"),
        status: parse_status(row.get::<String, _>("status"))?,
        winner_id: row.get("winner_id"),
        wager_id: row.get("wager_id"),
        started_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("started_at")
            .map(|t| t.and_utc()),
        finished_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("finished_at")
            .map(|t| t.and_utc()),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}
