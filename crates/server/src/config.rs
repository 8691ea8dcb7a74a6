//! Runtime configuration read from the environment (`.env` is loaded first)

use engine::activity::DEFAULT_HANDLES;
use engine::api::DEFAULT_BUNDLE_URL;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "data/dashboard.db";
pub const DEFAULT_ARBITRAGE_SNAPSHOT: &str = "data/Opinion/arbitrage_opportunities.json";
pub const DEFAULT_CLOSING_SNAPSHOT: &str = "data/Opinion/closing_markets.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub bundle_url: String,
    /// When set, predictions come from this JSON file instead of the database
    pub predictions_snapshot: Option<PathBuf>,
    pub tracked_handles: Vec<String>,
    /// Read when the arbitrage table is empty
    pub arbitrage_snapshot: PathBuf,
    pub closing_snapshot: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Self {
            db_path: non_empty("TRADE_DASH_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            bundle_url: non_empty("BUNDLE_FINDER_URL")
                .unwrap_or_else(|| DEFAULT_BUNDLE_URL.to_string()),
            predictions_snapshot: non_empty("PREDICTIONS_SNAPSHOT").map(PathBuf::from),
            tracked_handles: parse_handles(non_empty("TRACKED_HANDLES").as_deref()),
            arbitrage_snapshot: PathBuf::from(
                non_empty("OPINION_ARBITRAGE_SNAPSHOT")
                    .unwrap_or_else(|| DEFAULT_ARBITRAGE_SNAPSHOT.to_string()),
            ),
            closing_snapshot: PathBuf::from(
                non_empty("OPINION_CLOSING_SNAPSHOT")
                    .unwrap_or_else(|| DEFAULT_CLOSING_SNAPSHOT.to_string()),
            ),
        }
    }
}

/// Comma-separated handles; blank entries dropped, defaults when nothing is left
pub fn parse_handles(raw: Option<&str>) -> Vec<String> {
    let handles: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect();

    if handles.is_empty() {
        DEFAULT_HANDLES.iter().map(|h| h.to_string()).collect()
    } else {
        handles
    }
}
