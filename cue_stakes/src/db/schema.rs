//! Schema bootstrap for the wager platform.
//!
//! Creates the tables the engine needs when they do not exist yet. All
//! statements are idempotent so startup can run them unconditionally,
//! mirroring how deployments provision a fresh database.

use sqlx::PgPool;

/// Reserved account that accumulates platform fees.
pub const PLATFORM_ACCOUNT_ID: i64 = 1;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id BIGSERIAL PRIMARY KEY,
        balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
        currency TEXT NOT NULL DEFAULT 'BRL',
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wagers (
        id BIGSERIAL PRIMARY KEY,
        creator_id BIGINT NOT NULL REFERENCES accounts(id),
        opponent_id BIGINT REFERENCES accounts(id),
        stake BIGINT NOT NULL CHECK (stake > 0),
        platform_fee BIGINT NOT NULL CHECK (platform_fee >= 0),
        total_prize BIGINT NOT NULL CHECK (total_prize > 0),
        status TEXT NOT NULL DEFAULT 'open'
            CHECK (status IN ('open', 'matched', 'completed', 'cancelled')),
        winner_id BIGINT REFERENCES accounts(id),
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        matched_at TIMESTAMP,
        completed_at TIMESTAMP,
        CHECK (total_prize + platform_fee = 2 * stake)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS matches (
        id BIGSERIAL PRIMARY KEY,
        player_a_id BIGINT NOT NULL REFERENCES accounts(id),
        player_b_id BIGINT NOT NULL REFERENCES accounts(id),
        status TEXT NOT NULL DEFAULT 'waiting'
            CHECK (status IN ('waiting', 'playing', 'finished', 'cancelled')),
        winner_id BIGINT REFERENCES accounts(id),
        wager_id BIGINT REFERENCES wagers(id),
        started_at TIMESTAMP,
        finished_at TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_entries (
        id BIGSERIAL PRIMARY KEY,
        account_id BIGINT NOT NULL REFERENCES accounts(id),
        amount BIGINT NOT NULL,
        balance_after BIGINT NOT NULL,
        direction TEXT NOT NULL CHECK (direction IN ('debit', 'credit')),
        kind TEXT NOT NULL CHECK (kind IN (
            'deposit', 'withdrawal', 'escrow_hold', 'escrow_release',
            'bet_win', 'bet_refund', 'platform_fee'
        )),
        wager_id BIGINT REFERENCES wagers(id),
        match_id BIGINT REFERENCES matches(id),
        idempotency_key TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payment_intents (
        id BIGSERIAL PRIMARY KEY,
        account_id BIGINT NOT NULL REFERENCES accounts(id),
        kind TEXT NOT NULL CHECK (kind IN ('deposit', 'withdrawal')),
        amount BIGINT NOT NULL CHECK (amount > 0),
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'approved', 'rejected', 'cancelled')),
        method TEXT NOT NULL,
        external_reference TEXT NOT NULL UNIQUE,
        external_id TEXT,
        pix_key TEXT,
        description TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_wagers_status ON wagers (status, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_wagers_creator ON wagers (creator_id)",
    "CREATE INDEX IF NOT EXISTS idx_wagers_opponent ON wagers (opponent_id)",
    "CREATE INDEX IF NOT EXISTS idx_matches_wager ON matches (wager_id)",
    "CREATE INDEX IF NOT EXISTS idx_ledger_entries_account ON ledger_entries (account_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_ledger_entries_wager ON ledger_entries (wager_id)",
    "CREATE INDEX IF NOT EXISTS idx_payment_intents_account ON payment_intents (account_id, created_at DESC)",
];

/// Create all tables and indexes, and seed the platform fee account.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    // Seed the platform account and keep the id sequence ahead of it.
    sqlx::query(
        "INSERT INTO accounts (id, balance, currency) VALUES ($1, 0, 'BRL')
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(PLATFORM_ACCOUNT_ID)
    .execute(pool)
    .await?;

    sqlx::query("SELECT setval('accounts_id_seq', (SELECT COALESCE(MAX(id), 1) FROM accounts))")
        .execute(pool)
        .await?;

    Ok(())
}
