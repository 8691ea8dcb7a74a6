//! Per-forecaster win rates over settled markets

use crate::outcome::{is_prediction_correct, is_resolved};
use crate::predictions::{is_valid_attempt, select, PredictionView};
use crate::types::{Agent, MarketStatus, Prediction};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Accuracy of one forecaster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinRateResult {
    /// Percentage with one decimal, e.g. "66.7"
    pub rate: String,
    pub correct: u32,
    pub total: u32,
}

impl WinRateResult {
    fn from_counts(correct: u32, total: u32) -> Self {
        if total == 0 {
            return Self {
                rate: "0.0".to_string(),
                correct: 0,
                total: 0,
            };
        }
        // ties round up: 1 of 16 is "6.3"
        let pct = (Decimal::from(correct) * Decimal::ONE_HUNDRED / Decimal::from(total))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        Self {
            rate: format!("{pct:.1}"),
            correct,
            total,
        }
    }
}

/// Score `agent` over closed, resolved markets it actually answered.
/// Abstentions shrink the denominator instead of counting as misses.
pub fn calc_rate<'a, I>(predictions: I, agent: Agent) -> WinRateResult
where
    I: IntoIterator<Item = &'a Prediction>,
{
    let mut correct = 0u32;
    let mut total = 0u32;

    for p in predictions {
        if p.market_status != MarketStatus::Closed || !is_resolved(p.real_outcome.as_deref()) {
            continue;
        }
        let answer = agent.outcome(p);
        if !is_valid_attempt(answer) {
            continue;
        }
        total += 1;
        if is_prediction_correct(answer, p.real_outcome.as_deref()) {
            correct += 1;
        }
    }

    WinRateResult::from_counts(correct, total)
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentScore {
    pub agent: Agent,
    pub label: &'static str,
    #[serde(flatten)]
    pub result: WinRateResult,
}

/// Win rate for every forecaster over the selected view
pub fn scoreboard(predictions: &[Prediction], view: PredictionView) -> Vec<AgentScore> {
    let selected = select(predictions, view);
    Agent::ALL
        .iter()
        .map(|&agent| AgentScore {
            agent,
            label: agent.label(),
            result: calc_rate(selected.iter().copied(), agent),
        })
        .collect()
}
