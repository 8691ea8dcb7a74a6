//! Chart helpers for the market-cap ceiling scatter
//!
//! Time axis ticks sit on an absolute epoch grid (multiples of the step),
//! not on display-timezone hour boundaries.

use persistence::repository::MarketCapRecord;
use serde::Serialize;

pub const HOUR_MS: i64 = 3_600_000;

/// Finer ticks for shorter windows
pub fn tick_step_hours(window_hours: u32) -> u32 {
    match window_hours {
        0..=6 => 1,
        7..=12 => 2,
        13..=24 => 3,
        _ => 6,
    }
}

/// Ticks at multiples of `step_hours` inside `[min, max]`; falls back to
/// the two domain ends so the axis always has labels.
pub fn build_ticks(domain: (i64, i64), step_hours: u32) -> Vec<i64> {
    let (min, max) = domain;
    let step = i64::from(step_hours) * HOUR_MS;
    if step <= 0 {
        return vec![min, max];
    }

    let rem = min.rem_euclid(step);
    let start = if rem == 0 {
        Some(min)
    } else {
        min.checked_add(step - rem)
    };

    let mut ticks = Vec::new();
    let mut next = start;
    while let Some(t) = next.filter(|t| *t <= max) {
        ticks.push(t);
        next = t.checked_add(step);
    }

    if ticks.is_empty() {
        vec![min, max]
    } else {
        ticks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeWindow {
    pub domain: (i64, i64),
    pub step_hours: u32,
    pub ticks: Vec<i64>,
}

/// Lookback window ending at `now_ms`
pub fn time_window(now_ms: i64, window_hours: u32) -> TimeWindow {
    let domain = (now_ms - i64::from(window_hours) * HOUR_MS, now_ms);
    let step_hours = tick_step_hours(window_hours);
    TimeWindow {
        domain,
        step_hours,
        ticks: build_ticks(domain, step_hours),
    }
}

/// One launched token on the scatter (y in units of 10k USD)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: i64,
    pub y: f64,
    pub address: String,
    pub short_name: String,
    pub is_binance: bool,
}

/// Rows without an address, creation time or finite peak cap are dropped
pub fn scatter_points(rows: &[MarketCapRecord]) -> Vec<ScatterPoint> {
    rows.iter()
        .filter_map(|r| {
            if r.address.is_empty() {
                return None;
            }
            let x = r.create_date_ms?;
            let y = r.max_market_cap_wan.filter(|y| y.is_finite())?;
            Some(ScatterPoint {
                x,
                y,
                short_name: r
                    .short_name
                    .clone()
                    .unwrap_or_else(|| r.address.chars().take(8).collect()),
                address: r.address.clone(),
                is_binance: r.is_binance.unwrap_or(false),
            })
        })
        .collect()
}

/// A user-entered Y cap only counts when finite and positive
pub fn parse_y_cap(input: Option<f64>) -> Option<f64> {
    input.filter(|v| v.is_finite() && *v > 0.0)
}

/// Default axis ceiling: max y of the points shown, 0 when none
pub fn auto_y_max(points: &[ScatterPoint]) -> f64 {
    points.iter().map(|p| p.y).reduce(f64::max).unwrap_or(0.0)
}

pub fn average_y(points: &[ScatterPoint], binance: bool) -> Option<f64> {
    let ys: Vec<f64> = points
        .iter()
        .filter(|p| p.is_binance == binance)
        .map(|p| p.y)
        .collect();
    if ys.is_empty() {
        return None;
    }
    Some(ys.iter().sum::<f64>() / ys.len() as f64)
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketCapView {
    pub window: TimeWindow,
    pub launch_count: usize,
    pub y_cap: Option<f64>,
    pub auto_y_max: f64,
    pub avg_normal: Option<f64>,
    pub avg_binance: Option<f64>,
    pub points: Vec<ScatterPoint>,
}

/// Launch count and averages use every point; the cap only trims what is
/// plotted and the auto ceiling.
pub fn market_cap_view(
    rows: &[MarketCapRecord],
    now_ms: i64,
    window_hours: u32,
    y_cap_input: Option<f64>,
) -> MarketCapView {
    let all = scatter_points(rows);
    let y_cap = parse_y_cap(y_cap_input);
    let shown: Vec<ScatterPoint> = match y_cap {
        Some(cap) => all.iter().filter(|p| p.y <= cap).cloned().collect(),
        None => all.clone(),
    };

    MarketCapView {
        window: time_window(now_ms, window_hours),
        launch_count: all.len(),
        y_cap,
        auto_y_max: auto_y_max(&shown),
        avg_normal: average_y(&all, false),
        avg_binance: average_y(&all, true),
        points: shown,
    }
}
