//! Domain types shared by the dashboard transforms

use persistence::repository::{PredictionRecord, SmartWalletRecord, TradeRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle of a copy trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// A copy trade with parsed amounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub proxy_wallet: String,
    pub label: Option<String>,
    pub condition_id: String,
    pub asset_id: Option<String>,
    pub title: Option<String>,
    pub invested_amount: Decimal,
    pub realized_pnl: Decimal,
    pub status: TradeStatus,
    pub timestamp: Option<String>,
}

impl Trade {
    /// Parse a stored row. Returns `None` for rows that cannot take part in
    /// aggregation: blank wallet, unparseable amount or unknown status.
    pub fn from_record(record: TradeRecord) -> Option<Self> {
        if record.proxy_wallet.trim().is_empty() {
            return None;
        }
        let invested_amount = Decimal::from_str(record.invested_amount.trim()).ok()?;
        let realized_pnl = Decimal::from_str(record.realized_pnl.trim()).ok()?;
        let status = TradeStatus::parse(&record.status)?;

        Some(Self {
            id: record.id,
            proxy_wallet: record.proxy_wallet,
            label: record.label,
            condition_id: record.condition_id,
            asset_id: record.asset_id,
            title: record.title,
            invested_amount,
            realized_pnl,
            status,
            timestamp: record.timestamp,
        })
    }
}

/// Market resolution state of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    Open,
    Closed,
    Unknown,
}

impl MarketStatus {
    /// Exact, case-sensitive match on the stored value
    pub fn from_stored(s: Option<&str>) -> Self {
        match s {
            Some("CLOSED") => Self::Closed,
            Some("OPEN") => Self::Open,
            _ => Self::Unknown,
        }
    }
}

/// A human vs AI prediction for one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub slug: String,
    pub title: Option<String>,
    pub question: Option<String>,
    pub ai_outcome: Option<String>,
    pub ai_reasoning: Option<String>,
    pub grok_outcome: Option<String>,
    pub grok_reasoning: Option<String>,
    pub doubao_outcome: Option<String>,
    pub human_outcome: Option<String>,
    pub real_outcome: Option<String>,
    pub market_status: MarketStatus,
    pub human_price: Option<f64>,
    pub is_excluded: bool,
}

impl From<PredictionRecord> for Prediction {
    fn from(record: PredictionRecord) -> Self {
        Self {
            market_status: MarketStatus::from_stored(record.market_status.as_deref()),
            slug: record.slug,
            title: record.title,
            question: record.question,
            ai_outcome: record.ai_outcome,
            ai_reasoning: record.ai_reasoning,
            grok_outcome: record.grok_outcome,
            grok_reasoning: record.grok_reasoning,
            doubao_outcome: record.doubao_outcome,
            human_outcome: record.human_outcome,
            real_outcome: record.real_outcome,
            human_price: record.human_price,
            is_excluded: record.is_excluded,
        }
    }
}

impl Prediction {
    /// Title falling back to the raw question
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.question.as_deref())
            .unwrap_or(self.slug.as_str())
    }
}

/// Forecasters compared on the human vs AI pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Human,
    Gemini,
    Grok,
    Doubao,
}

impl Agent {
    pub const ALL: [Agent; 4] = [Agent::Human, Agent::Gemini, Agent::Grok, Agent::Doubao];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Gemini => "Gemini 2.5",
            Self::Grok => "Grok",
            Self::Doubao => "Doubao",
        }
    }

    pub fn outcome<'a>(&self, prediction: &'a Prediction) -> Option<&'a str> {
        match self {
            Self::Human => prediction.human_outcome.as_deref(),
            Self::Gemini => prediction.ai_outcome.as_deref(),
            Self::Grok => prediction.grok_outcome.as_deref(),
            Self::Doubao => prediction.doubao_outcome.as_deref(),
        }
    }

    /// Model explanation; only Gemini and Grok record one
    pub fn reasoning<'a>(&self, prediction: &'a Prediction) -> Option<&'a str> {
        match self {
            Self::Gemini => prediction.ai_reasoning.as_deref(),
            Self::Grok => prediction.grok_reasoning.as_deref(),
            Self::Human | Self::Doubao => None,
        }
    }
}

/// Smart wallet row with non-finite metrics cleared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartWallet {
    pub address: String,
    pub label: String,
    pub total_trades: i64,
    pub total_profit: f64,
    pub avg_profit_per_trade: Option<f64>,
    pub avg_profit_rate: Option<f64>,
    pub win_rate: Option<f64>,
    pub avg_total_profit: Option<f64>,
    pub top5_profit_ratio: Option<f64>,
    pub top10_profit_ratio: Option<f64>,
    pub top5_loss_ratio: Option<f64>,
    pub top10_loss_ratio: Option<f64>,
    pub updated_at: Option<String>,
}

pub const UNKNOWN_WALLET_LABEL: &str = "Unknown";

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

impl SmartWallet {
    /// `None` when the address is blank or total profit is missing/non-finite
    pub fn from_record(record: SmartWalletRecord) -> Option<Self> {
        if record.address.trim().is_empty() {
            return None;
        }
        let total_profit = finite(record.total_profit)?;

        Some(Self {
            label: record
                .label
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_WALLET_LABEL.to_string()),
            address: record.address,
            total_trades: record.total_trades,
            total_profit,
            avg_profit_per_trade: finite(record.avg_profit_per_trade),
            avg_profit_rate: finite(record.avg_profit_rate),
            win_rate: finite(record.win_rate),
            avg_total_profit: finite(record.avg_total_profit),
            top5_profit_ratio: finite(record.top5_profit_ratio),
            top10_profit_ratio: finite(record.top10_profit_ratio),
            top5_loss_ratio: finite(record.top5_loss_ratio),
            top10_loss_ratio: finite(record.top10_loss_ratio),
            updated_at: record.updated_at,
        })
    }
}
