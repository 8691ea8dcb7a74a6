//! Database schema definitions

/// SQL to create all tables
/// NOTE: Trade amounts stored as TEXT to preserve rust_decimal::Decimal precision
pub const CREATE_TABLES: &str = r#"
-- Copy-trading fills, one row per mirrored position
CREATE TABLE IF NOT EXISTS trades (
    id TEXT PRIMARY KEY,
    proxy_wallet TEXT NOT NULL,
    label TEXT,
    condition_id TEXT NOT NULL,
    asset_id TEXT,
    title TEXT,
    invested_amount TEXT NOT NULL DEFAULT '0',
    realized_pnl TEXT NOT NULL DEFAULT '0',
    status TEXT NOT NULL DEFAULT 'OPEN',
    timestamp TEXT,
    created_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- Smart wallet leaderboard (computed offline, read-only here)
CREATE TABLE IF NOT EXISTS smart_wallets (
    address TEXT PRIMARY KEY,
    label TEXT,
    total_trades INTEGER NOT NULL DEFAULT 0,
    total_profit REAL,
    avg_profit_per_trade REAL,
    avg_profit_rate REAL,
    win_rate REAL,
    avg_total_profit REAL,
    top5_profit_ratio REAL,
    top10_profit_ratio REAL,
    top5_loss_ratio REAL,
    top10_loss_ratio REAL,
    updated_at TEXT
);

-- Human vs AI predictions, one row per market slug
CREATE TABLE IF NOT EXISTS ai_predictions (
    slug TEXT PRIMARY KEY,
    title TEXT,
    question TEXT,
    ai_outcome TEXT,
    ai_reasoning TEXT,
    grok_outcome TEXT,
    grok_reasoning TEXT,
    doubao_outcome TEXT,
    human_outcome TEXT,
    real_outcome TEXT,
    market_status TEXT,
    human_price REAL,
    is_excluded INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- Hourly posting probability per handle and weekday (0 = Monday)
CREATE TABLE IF NOT EXISTS user_activity_profiles (
    handle TEXT NOT NULL,
    hour INTEGER NOT NULL,
    day_of_week INTEGER NOT NULL,
    category TEXT NOT NULL DEFAULT 'all',
    probability REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (handle, hour, day_of_week, category)
);

-- Peak market cap of newly launched tokens (unit: 10k USD)
CREATE TABLE IF NOT EXISTS daily_market_cap_ceiling (
    address TEXT PRIMARY KEY,
    short_name TEXT,
    create_date_ms INTEGER,
    max_market_cap_wan REAL,
    is_eligible INTEGER,
    is_binance INTEGER
);

-- Opinion vs Polymarket arbitrage events, one JSON document per row
CREATE TABLE IF NOT EXISTS opinion_arbitrage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    raw_data TEXT NOT NULL,
    created_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_trades_timestamp ON trades(timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_trades_wallet ON trades(proxy_wallet);
CREATE INDEX IF NOT EXISTS idx_smart_wallets_profit ON smart_wallets(total_profit DESC);
CREATE INDEX IF NOT EXISTS idx_predictions_status ON ai_predictions(market_status, title);
CREATE INDEX IF NOT EXISTS idx_activity_lookup ON user_activity_profiles(day_of_week, handle, hour);
CREATE INDEX IF NOT EXISTS idx_market_cap_created ON daily_market_cap_ceiling(create_date_ms)
"#;

/// Column additions applied after CREATE_TABLES on existing databases.
/// "duplicate column name" failures are expected and ignored.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE ai_predictions ADD COLUMN doubao_outcome TEXT",
    "ALTER TABLE ai_predictions ADD COLUMN human_price REAL",
];
