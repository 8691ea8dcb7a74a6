//! Human vs AI prediction views
//!
//! Selection policy applied before any judgment: excluded markets and
//! markets no forecaster engaged with are dropped from every view.

use crate::outcome::{judge_outcome, Verdict, UNKNOWN_OUTCOME};
use crate::types::{Agent, MarketStatus, Prediction};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Human price at or above this is a foregone conclusion, not a forecast
pub const NEAR_CERTAIN_PRICE: f64 = 0.97;

/// Which subset of predictions a page shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionView {
    #[default]
    All,
    Settled,
    /// Settled, minus near-certain markets
    ExclusiveSettled,
}

impl FromStr for PredictionView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "settled" => Ok(Self::Settled),
            "exclusive" | "exclusive_settled" | "exclusive-settled" => Ok(Self::ExclusiveSettled),
            other => Err(format!("unknown view '{other}' (expected all, settled, exclusive)")),
        }
    }
}

/// Non-blank and not the "Unknown" placeholder
pub fn is_valid_attempt(outcome: Option<&str>) -> bool {
    matches!(outcome.map(str::trim), Some(o) if !o.is_empty() && o != UNKNOWN_OUTCOME)
}

/// Not excluded, and at least one forecaster produced an answer
pub fn is_tracked(prediction: &Prediction) -> bool {
    !prediction.is_excluded
        && Agent::ALL
            .iter()
            .any(|agent| is_valid_attempt(agent.outcome(prediction)))
}

fn is_near_certain(prediction: &Prediction) -> bool {
    matches!(prediction.human_price, Some(p) if p >= NEAR_CERTAIN_PRICE)
}

/// Apply the tracking policy, then the view's own filter. Order is preserved.
pub fn select(predictions: &[Prediction], view: PredictionView) -> Vec<&Prediction> {
    predictions
        .iter()
        .filter(|p| is_tracked(p))
        .filter(|p| match view {
            PredictionView::All => true,
            PredictionView::Settled => p.market_status == MarketStatus::Closed,
            PredictionView::ExclusiveSettled => {
                p.market_status == MarketStatus::Closed && !is_near_certain(p)
            }
        })
        .collect()
}

/// One forecaster's answer with its badge
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub agent: Agent,
    pub label: &'static str,
    pub outcome: Option<String>,
    pub reasoning: Option<String>,
    pub verdict: Verdict,
}

/// Table row for one market
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRow {
    pub slug: String,
    pub title: String,
    pub question: Option<String>,
    pub market_status: MarketStatus,
    pub real_outcome: Option<String>,
    pub human_price: Option<f64>,
    pub outcomes: Vec<AgentOutcome>,
}

/// Badge for one forecaster; no verdict until the market has closed
pub fn verdict_for(prediction: &Prediction, agent: Agent) -> Verdict {
    if prediction.market_status != MarketStatus::Closed {
        return Verdict::Undetermined;
    }
    judge_outcome(agent.outcome(prediction), prediction.real_outcome.as_deref())
}

pub fn build_rows(predictions: &[Prediction], view: PredictionView) -> Vec<PredictionRow> {
    select(predictions, view)
        .into_iter()
        .map(|p| PredictionRow {
            slug: p.slug.clone(),
            title: p.display_title().to_string(),
            question: p.question.clone(),
            market_status: p.market_status,
            real_outcome: p.real_outcome.clone(),
            human_price: p.human_price,
            outcomes: Agent::ALL
                .iter()
                .map(|&agent| AgentOutcome {
                    agent,
                    label: agent.label(),
                    outcome: agent.outcome(p).map(String::from),
                    reasoning: agent.reasoning(p).map(String::from),
                    verdict: verdict_for(p, agent),
                })
                .collect(),
        })
        .collect()
}
