//! Trade Dash Engine — analytics behind the trading dashboard
//!
//! Provides:
//! - Copy-trading leaderboard and smart wallet ranking
//! - Prediction outcome matching and per-agent win rates
//! - Hourly speech probability profiles on a Beijing clock
//! - Market-cap ceiling scatter with time axis ticks
//! - Bundle finder client for the remote analysis server
//! - Opinion vs Polymarket arbitrage spreads and the closing-markets list

pub mod activity;
pub mod arbitrage;
pub mod api;
pub mod chart;
pub mod leaderboard;
pub mod outcome;
pub mod predictions;
pub mod sources;
pub mod types;
pub mod win_rate;

// Re-exports for convenience
pub use activity::{
    beijing_clock, reduce_profiles, speech_probability, ActivityCategory, ActivityProfileSeries,
    BeijingClock, HourPoint, SpeechProbability,
};
pub use arbitrage::{
    arbitrage_view, sort_closing_markets, ArbitrageEvent, ArbitrageView, ClosingMarket, ClosingSort,
    ClosingView, EventSort, SortDirection,
};
pub use api::{AnalyzeRequest, AnalyzeResult, BundleError, BundleFinderClient};
pub use chart::{build_ticks, market_cap_view, time_window, MarketCapView, TimeWindow};
pub use leaderboard::{group_trades, rank_smart_wallets, summarize, DashboardSummary, TraderStats};
pub use outcome::{is_prediction_correct, judge_outcome, Verdict};
pub use predictions::{build_rows, PredictionRow, PredictionView};
pub use sources::{
    DatabaseSource, OpinionSource, OpinionStore, PredictionSource, SnapshotFileSource,
    StaticOpinionSource, StaticSource,
};
pub use types::*;
pub use win_rate::{calc_rate, scoreboard, AgentScore, WinRateResult};
