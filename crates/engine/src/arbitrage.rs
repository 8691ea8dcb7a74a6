//! Opinion vs Polymarket arbitrage
//!
//! Matched events carry both venues' prices per outcome. The view computes
//! the absolute price gap for each market, scales spreads and volumes into
//! bar widths relative to the largest value in the event, and keeps the 20
//! busiest events for the volume comparison chart. The closing list sorts
//! Opinion markets by cutoff or volume.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

pub const VOLUME_CHART_LIMIT: usize = 20;
/// Floors for bar scaling so an all-zero event does not divide by zero
pub const MIN_SPREAD_SCALE: f64 = 0.0001;
pub const MIN_VOLUME_SCALE: f64 = 1.0;

/// Prices and volumes arrive as JSON numbers or decimal strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Finite value, `None` for blank or non-numeric text
    pub fn value(&self) -> Option<f64> {
        let v = match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

fn amount_or_zero(amount: Option<&Amount>) -> f64 {
    amount.and_then(Amount::value).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Input documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionStats {
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<Amount>,
    #[serde(rename = "volume7d")]
    pub volume_7d: Option<Amount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolymarketStats {
    #[serde(rename = "volume24hr")]
    pub volume_24hr: Option<Amount>,
    #[serde(rename = "volume1wk")]
    pub volume_1wk: Option<Amount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionDetailsData {
    #[serde(rename = "marketTitle")]
    pub market_title: Option<String>,
    #[serde(rename = "statusEnum")]
    pub status: Option<String>,
    pub volume: Option<Amount>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<Amount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionDetailsResult {
    pub data: Option<OpinionDetailsData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionDetails {
    pub result: Option<OpinionDetailsResult>,
}

/// One outcome matched across both venues
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrageMarket {
    pub opinion_outcome: String,
    pub polymarket_outcome: String,
    pub outcome_match_score: f64,
    pub opinion_market_id: Option<serde_json::Value>,
    pub opinion_details: Option<OpinionDetails>,
    pub opinion_price: Option<Amount>,
    /// Outcome prices; the first entry is the YES price
    pub polymarket_prices: Vec<Amount>,
    pub polymarket_market_id: Option<serde_json::Value>,
    pub polymarket_volume: Option<Amount>,
}

impl ArbitrageMarket {
    pub fn opinion_price(&self) -> Option<f64> {
        self.opinion_price.as_ref().and_then(Amount::value)
    }

    pub fn polymarket_yes_price(&self) -> Option<f64> {
        self.polymarket_prices.first().and_then(Amount::value)
    }

    pub fn opinion_volume(&self) -> f64 {
        let volume = self
            .opinion_details
            .as_ref()
            .and_then(|d| d.result.as_ref())
            .and_then(|r| r.data.as_ref())
            .and_then(|d| d.volume.as_ref());
        amount_or_zero(volume)
    }

    pub fn polymarket_volume(&self) -> f64 {
        amount_or_zero(self.polymarket_volume.as_ref())
    }

    /// `|opinion - polymarket YES|`, only when both prices are known
    pub fn spread(&self) -> Option<f64> {
        Some((self.opinion_price()? - self.polymarket_yes_price()?).abs())
    }
}

/// An Opinion event paired with its Polymarket counterpart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrageEvent {
    pub event_title: String,
    pub polymarket_event_title: String,
    pub match_score: f64,
    #[serde(rename = "cutoffAt", skip_serializing_if = "Option::is_none")]
    pub cutoff_at: Option<i64>,
    pub opinion_stats: OpinionStats,
    pub polymarket_stats: PolymarketStats,
    pub markets: Vec<ArbitrageMarket>,
}

impl ArbitrageEvent {
    pub fn opinion_volume_24h(&self) -> f64 {
        amount_or_zero(self.opinion_stats.volume_24h.as_ref())
    }

    pub fn polymarket_volume_24h(&self) -> f64 {
        amount_or_zero(self.polymarket_stats.volume_24hr.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown direction '{other}' (expected asc, desc)")),
        }
    }
}

/// Sort key for arbitrage events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSort {
    #[default]
    OpinionVolume,
    PolymarketVolume,
    Cutoff,
}

impl EventSort {
    fn key(self, event: &ArbitrageEvent) -> f64 {
        match self {
            EventSort::OpinionVolume => event.opinion_volume_24h(),
            EventSort::PolymarketVolume => event.polymarket_volume_24h(),
            EventSort::Cutoff => event.cutoff_at.unwrap_or(0) as f64,
        }
    }
}

impl FromStr for EventSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "opinion_volume" | "opinion" => Ok(Self::OpinionVolume),
            "polymarket_volume" | "polymarket" => Ok(Self::PolymarketVolume),
            "cutoff" => Ok(Self::Cutoff),
            other => Err(format!(
                "unknown sort '{other}' (expected opinion_volume, polymarket_volume, cutoff)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Arbitrage view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSpread {
    pub opinion_outcome: String,
    pub polymarket_outcome: String,
    pub outcome_match_score: f64,
    pub opinion_market_id: Option<serde_json::Value>,
    pub polymarket_market_id: Option<serde_json::Value>,
    pub opinion_price: Option<f64>,
    pub polymarket_price: Option<f64>,
    pub spread: Option<f64>,
    pub opinion_volume: f64,
    pub polymarket_volume: f64,
    /// Bar widths in percent of the event's largest value
    pub spread_pct: f64,
    pub opinion_volume_pct: f64,
    pub polymarket_volume_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub event_title: String,
    pub polymarket_event_title: String,
    pub match_score: f64,
    /// e.g. "93.5"
    pub match_pct: String,
    pub cutoff_at: Option<i64>,
    pub opinion_volume_24h: f64,
    pub polymarket_volume_24h: f64,
    pub markets: Vec<MarketSpread>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBar {
    pub name: String,
    pub opinion_volume: f64,
    pub polymarket_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageView {
    pub sort: EventSort,
    pub direction: SortDirection,
    pub events: Vec<EventView>,
    pub volume_chart: Vec<VolumeBar>,
}

/// Score in [0, 1] as a one-decimal percentage, ties rounded up
pub fn match_percent(score: f64) -> String {
    match Decimal::try_from(score) {
        Ok(d) => {
            let pct = (d * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            format!("{pct:.1}")
        }
        Err(_) => "0.0".to_string(),
    }
}

fn percent_of(value: f64, max: f64) -> f64 {
    value / max * 100.0
}

fn market_spreads(markets: &[ArbitrageMarket]) -> Vec<MarketSpread> {
    let stats: Vec<(Option<f64>, f64, f64)> = markets
        .iter()
        .map(|m| (m.spread(), m.opinion_volume(), m.polymarket_volume()))
        .collect();

    let max_spread = stats
        .iter()
        .map(|(s, _, _)| s.unwrap_or(0.0))
        .fold(MIN_SPREAD_SCALE, f64::max);
    let max_opinion = stats.iter().map(|(_, o, _)| *o).fold(MIN_VOLUME_SCALE, f64::max);
    let max_poly = stats.iter().map(|(_, _, p)| *p).fold(MIN_VOLUME_SCALE, f64::max);

    markets
        .iter()
        .zip(stats)
        .map(|(m, (spread, opinion_volume, polymarket_volume))| MarketSpread {
            opinion_outcome: m.opinion_outcome.clone(),
            polymarket_outcome: m.polymarket_outcome.clone(),
            outcome_match_score: m.outcome_match_score,
            opinion_market_id: m.opinion_market_id.clone(),
            polymarket_market_id: m.polymarket_market_id.clone(),
            opinion_price: m.opinion_price(),
            polymarket_price: m.polymarket_yes_price(),
            spread,
            opinion_volume,
            polymarket_volume,
            spread_pct: percent_of(spread.unwrap_or(0.0), max_spread),
            opinion_volume_pct: percent_of(opinion_volume, max_opinion),
            polymarket_volume_pct: percent_of(polymarket_volume, max_poly),
        })
        .collect()
}

/// Sort events (descending unless told otherwise) and derive spreads and chart bars
pub fn arbitrage_view(
    mut events: Vec<ArbitrageEvent>,
    sort: EventSort,
    direction: Option<SortDirection>,
) -> ArbitrageView {
    let direction = direction.unwrap_or(SortDirection::Desc);
    events.sort_by(|a, b| direction.apply(sort.key(a).total_cmp(&sort.key(b))));

    let volume_chart = events
        .iter()
        .take(VOLUME_CHART_LIMIT)
        .map(|e| VolumeBar {
            name: e.event_title.clone(),
            opinion_volume: e.opinion_volume_24h(),
            polymarket_volume: e.polymarket_volume_24h(),
        })
        .collect();

    let events = events
        .iter()
        .map(|e| EventView {
            event_title: e.event_title.clone(),
            polymarket_event_title: e.polymarket_event_title.clone(),
            match_score: e.match_score,
            match_pct: match_percent(e.match_score),
            cutoff_at: e.cutoff_at,
            opinion_volume_24h: e.opinion_volume_24h(),
            polymarket_volume_24h: e.polymarket_volume_24h(),
            markets: market_spreads(&e.markets),
        })
        .collect();

    ArbitrageView {
        sort,
        direction,
        events,
        volume_chart,
    }
}

// ---------------------------------------------------------------------------
// Closing markets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub price: Option<Amount>,
    #[serde(alias = "size")]
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orderbook {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChildMarket {
    pub market_title: String,
    pub volume: Option<Amount>,
    pub yes_token_id: Option<String>,
    pub no_token_id: Option<String>,
    pub yes_orderbook: Option<Orderbook>,
    pub no_orderbook: Option<Orderbook>,
}

/// Opinion market nearing its cutoff; `cutoffAt` is in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClosingMarket {
    pub market_id: Option<serde_json::Value>,
    pub market_title: String,
    pub volume: Option<Amount>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<Amount>,
    pub cutoff_at: Option<i64>,
    pub child_markets: Vec<ChildMarket>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingSort {
    #[default]
    Cutoff,
    Volume,
}

impl ClosingSort {
    /// Nearest cutoff first, largest volume first
    pub fn default_direction(self) -> SortDirection {
        match self {
            ClosingSort::Cutoff => SortDirection::Asc,
            ClosingSort::Volume => SortDirection::Desc,
        }
    }

    fn key(self, market: &ClosingMarket) -> f64 {
        match self {
            ClosingSort::Cutoff => market.cutoff_at.unwrap_or(0) as f64,
            ClosingSort::Volume => amount_or_zero(market.volume.as_ref()),
        }
    }
}

impl FromStr for ClosingSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cutoff" => Ok(Self::Cutoff),
            "volume" => Ok(Self::Volume),
            other => Err(format!("unknown sort '{other}' (expected cutoff, volume)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosingView {
    pub sort: ClosingSort,
    pub direction: SortDirection,
    pub markets: Vec<ClosingMarket>,
}

/// Stable sort; equal keys keep file order
pub fn sort_closing_markets(
    mut markets: Vec<ClosingMarket>,
    sort: ClosingSort,
    direction: Option<SortDirection>,
) -> ClosingView {
    let direction = direction.unwrap_or_else(|| sort.default_direction());
    markets.sort_by(|a, b| direction.apply(sort.key(a).total_cmp(&sort.key(b))));
    ClosingView {
        sort,
        direction,
        markets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, opinion_24h: &str, poly_24h: f64, markets: serde_json::Value) -> ArbitrageEvent {
        serde_json::from_value(serde_json::json!({
            "event_title": title,
            "polymarket_event_title": format!("{title} (PM)"),
            "match_score": 0.935,
            "opinion_stats": {"volume24h": opinion_24h, "volume7d": "0"},
            "polymarket_stats": {"volume24hr": poly_24h, "volume1wk": 0},
            "markets": markets,
        }))
        .unwrap()
    }

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        let parsed: Vec<Amount> = serde_json::from_str(r#"[0.42, "0.58", "", "abc", 7]"#).unwrap();
        let values: Vec<Option<f64>> = parsed.iter().map(Amount::value).collect();
        assert_eq!(values, vec![Some(0.42), Some(0.58), None, None, Some(7.0)]);
    }

    #[test]
    fn test_spread_needs_both_prices() {
        let e = event(
            "BTC above 100k",
            "1000",
            500.0,
            serde_json::json!([
                {"opinion_outcome": "Yes", "opinion_price": "0.60", "polymarket_prices": ["0.45", "0.55"],
                 "opinion_details": {"result": {"data": {"volume": "2000"}}}, "polymarket_volume": "4000"},
                {"opinion_outcome": "No", "opinion_price": null, "polymarket_prices": ["0.30"],
                 "opinion_details": {"result": {"data": {"volume": "500"}}}, "polymarket_volume": "1000"},
                {"opinion_outcome": "Maybe", "opinion_price": "0.20", "polymarket_prices": []}
            ]),
        );

        let view = arbitrage_view(vec![e], EventSort::default(), None);
        let markets = &view.events[0].markets;

        assert!((markets[0].spread.unwrap() - 0.15).abs() < 1e-9);
        assert_eq!(markets[1].spread, None);
        assert_eq!(markets[2].spread, None);
        assert_eq!(markets[2].polymarket_price, None);

        assert!((markets[0].spread_pct - 100.0).abs() < 1e-9);
        assert_eq!(markets[1].spread_pct, 0.0);
        assert_eq!(markets[0].opinion_volume_pct, 100.0);
        assert_eq!(markets[1].opinion_volume_pct, 25.0);
        assert_eq!(markets[1].polymarket_volume_pct, 25.0);
        assert_eq!(markets[2].opinion_volume, 0.0);
    }

    #[test]
    fn test_bars_use_floor_when_everything_is_zero() {
        let e = event(
            "quiet",
            "0",
            0.0,
            serde_json::json!([{"opinion_price": "0.5", "polymarket_prices": ["0.5"]}]),
        );
        let view = arbitrage_view(vec![e], EventSort::default(), None);
        let m = &view.events[0].markets[0];
        assert_eq!(m.spread, Some(0.0));
        assert_eq!(m.spread_pct, 0.0);
        assert_eq!(m.opinion_volume_pct, 0.0);
    }

    #[test]
    fn test_events_sorted_and_chart_capped() {
        let events: Vec<ArbitrageEvent> = (0..25)
            .map(|i| event(&format!("e{i}"), &(i * 10).to_string(), (100 - i) as f64, serde_json::json!([])))
            .collect();

        let by_opinion = arbitrage_view(events.clone(), EventSort::OpinionVolume, None);
        assert_eq!(by_opinion.direction, SortDirection::Desc);
        assert_eq!(by_opinion.events[0].event_title, "e24");
        assert_eq!(by_opinion.volume_chart.len(), VOLUME_CHART_LIMIT);
        assert_eq!(by_opinion.volume_chart[0].opinion_volume, 240.0);
        assert_eq!(by_opinion.volume_chart[19].name, "e5");

        let by_poly = arbitrage_view(events, EventSort::PolymarketVolume, Some(SortDirection::Asc));
        assert_eq!(by_poly.events[0].event_title, "e24");
        assert_eq!(by_poly.events[24].event_title, "e0");
    }

    #[test]
    fn test_match_percent() {
        assert_eq!(match_percent(0.935), "93.5");
        assert_eq!(match_percent(0.9999), "100.0");
        assert_eq!(match_percent(0.0125), "1.3");
        assert_eq!(match_percent(f64::NAN), "0.0");
    }

    #[test]
    fn test_closing_markets_default_directions() {
        let markets: Vec<ClosingMarket> = serde_json::from_str(
            r#"[
                {"marketId": "1", "marketTitle": "late", "volume": "50", "cutoffAt": 1700009000, "childMarkets": []},
                {"marketId": "2", "marketTitle": "soon", "volume": "900", "cutoffAt": 1700001000,
                 "childMarkets": [{"marketTitle": "child", "volume": "10",
                     "yesOrderbook": {"bids": [{"price": "0.4", "size": "12"}], "asks": []}}]},
                {"marketId": 3, "marketTitle": "no volume", "cutoffAt": 1700005000}
            ]"#,
        )
        .unwrap();

        let by_cutoff = sort_closing_markets(markets.clone(), ClosingSort::Cutoff, None);
        assert_eq!(by_cutoff.direction, SortDirection::Asc);
        let titles: Vec<&str> = by_cutoff.markets.iter().map(|m| m.market_title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "no volume", "late"]);

        let by_volume = sort_closing_markets(markets, ClosingSort::Volume, None);
        assert_eq!(by_volume.direction, SortDirection::Desc);
        let titles: Vec<&str> = by_volume.markets.iter().map(|m| m.market_title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "late", "no volume"]);

        let bids = &by_volume.markets[0].child_markets[0]
            .yes_orderbook
            .as_ref()
            .unwrap()
            .bids;
        assert_eq!(bids[0].amount.as_ref().and_then(Amount::value), Some(12.0));
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("Volume".parse::<ClosingSort>(), Ok(ClosingSort::Volume));
        assert_eq!("polymarket_volume".parse::<EventSort>(), Ok(EventSort::PolymarketVolume));
        assert_eq!(" DESC ".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("sideways".parse::<SortDirection>().is_err());
        assert!("price".parse::<ClosingSort>().is_err());
    }
}
