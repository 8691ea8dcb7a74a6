//! Copy-trading leaderboard — group mirrored trades by followed wallet
//!
//! Also ranks the offline-computed smart wallet table.

use crate::types::{SmartWallet, Trade};
use persistence::repository::{SmartWalletRecord, TradeRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Label shown for wallets whose trades never carried one
pub const UNKNOWN_TRADER_LABEL: &str = "未知";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Totals for one followed wallet
#[derive(Debug, Clone, Serialize)]
pub struct TraderStats {
    pub label: String,
    pub proxy_wallet: String,
    pub total_trades: usize,
    pub total_invested: Decimal,
    pub total_realized_pnl: Decimal,
    /// In arrival order (input is newest first)
    pub trades: Vec<Trade>,
}

impl TraderStats {
    fn empty(trade: &Trade) -> Self {
        Self {
            label: trade
                .label
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_TRADER_LABEL.to_string()),
            proxy_wallet: trade.proxy_wallet.clone(),
            total_trades: 0,
            total_invested: Decimal::ZERO,
            total_realized_pnl: Decimal::ZERO,
            trades: Vec::new(),
        }
    }
}

/// Headline cards of the copy-trading page
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_realized_pnl: Decimal,
    pub total_invested: Decimal,
    pub total_trades: usize,
    pub traders: usize,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Parse stored rows, dropping the ones that cannot be aggregated
pub fn trades_from_records(records: Vec<TradeRecord>) -> Vec<Trade> {
    let fetched = records.len();
    let trades: Vec<Trade> = records.into_iter().filter_map(Trade::from_record).collect();
    if trades.len() < fetched {
        debug!(
            dropped = fetched - trades.len(),
            kept = trades.len(),
            "Skipped malformed trade rows"
        );
    }
    trades
}

/// Group by `proxy_wallet`, most profitable wallet first.
/// Ties keep first-seen order.
pub fn group_trades(trades: impl IntoIterator<Item = Trade>) -> Vec<TraderStats> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<TraderStats> = Vec::new();

    for trade in trades {
        let slot = *index.entry(trade.proxy_wallet.clone()).or_insert_with(|| {
            groups.push(TraderStats::empty(&trade));
            groups.len() - 1
        });
        let stats = &mut groups[slot];
        stats.total_trades += 1;
        stats.total_invested += trade.invested_amount;
        stats.total_realized_pnl += trade.realized_pnl;
        stats.trades.push(trade);
    }

    // stable sort keeps insertion order on ties
    groups.sort_by(|a, b| b.total_realized_pnl.cmp(&a.total_realized_pnl));
    groups
}

pub fn summarize(stats: &[TraderStats]) -> DashboardSummary {
    DashboardSummary {
        total_realized_pnl: stats.iter().map(|s| s.total_realized_pnl).sum(),
        total_invested: stats.iter().map(|s| s.total_invested).sum(),
        total_trades: stats.iter().map(|s| s.total_trades).sum(),
        traders: stats.len(),
    }
}

// ---------------------------------------------------------------------------
// Smart wallets
// ---------------------------------------------------------------------------

/// Valid wallets ordered by total profit descending
pub fn rank_smart_wallets(records: Vec<SmartWalletRecord>) -> Vec<SmartWallet> {
    let mut wallets: Vec<SmartWallet> = records
        .into_iter()
        .filter_map(SmartWallet::from_record)
        .collect();
    wallets.sort_by(|a, b| b.total_profit.total_cmp(&a.total_profit));
    wallets
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TradeStatus;
    use rust_decimal_macros::dec;

    fn make_trade(id: &str, wallet: &str, label: Option<&str>, invested: Decimal, pnl: Decimal) -> Trade {
        Trade {
            id: id.into(),
            proxy_wallet: wallet.into(),
            label: label.map(String::from),
            condition_id: format!("cond-{id}"),
            asset_id: None,
            title: Some("Test Market".into()),
            invested_amount: invested,
            realized_pnl: pnl,
            status: TradeStatus::Closed,
            timestamp: None,
        }
    }

    fn sample() -> Vec<Trade> {
        vec![
            make_trade("1", "0xa", Some("alpha"), dec!(100), dec!(10.5)),
            make_trade("2", "0xb", None, dec!(40), dec!(-5)),
            make_trade("3", "0xa", Some("renamed"), dec!(60.25), dec!(-2.5)),
            make_trade("4", "0xc", Some("gamma"), dec!(10), dec!(30)),
            make_trade("5", "0xb", Some("beta"), dec!(5), dec!(1)),
        ]
    }

    #[test]
    fn test_group_totals_match_member_sums() {
        let trades = sample();
        let groups = group_trades(trades.clone());

        let counted: usize = groups.iter().map(|g| g.total_trades).sum();
        assert_eq!(counted, trades.len());

        for g in &groups {
            assert_eq!(g.total_trades, g.trades.len());
            let invested: Decimal = g.trades.iter().map(|t| t.invested_amount).sum();
            let pnl: Decimal = g.trades.iter().map(|t| t.realized_pnl).sum();
            assert_eq!(g.total_invested, invested);
            assert_eq!(g.total_realized_pnl, pnl);
        }

        let a = groups.iter().find(|g| g.proxy_wallet == "0xa").unwrap();
        assert_eq!(a.total_invested, dec!(160.25));
        assert_eq!(a.total_realized_pnl, dec!(8.0));
    }

    #[test]
    fn test_groups_sorted_by_pnl_descending() {
        let groups = group_trades(sample());
        let wallets: Vec<&str> = groups.iter().map(|g| g.proxy_wallet.as_str()).collect();
        assert_eq!(wallets, vec!["0xc", "0xa", "0xb"]);
        for pair in groups.windows(2) {
            assert!(pair[0].total_realized_pnl >= pair[1].total_realized_pnl);
        }
    }

    #[test]
    fn test_label_from_first_seen_trade() {
        let groups = group_trades(sample());
        let a = groups.iter().find(|g| g.proxy_wallet == "0xa").unwrap();
        let b = groups.iter().find(|g| g.proxy_wallet == "0xb").unwrap();
        assert_eq!(a.label, "alpha");
        assert_eq!(b.label, UNKNOWN_TRADER_LABEL);
    }

    #[test]
    fn test_trade_order_preserved_within_group() {
        let groups = group_trades(sample());
        let b = groups.iter().find(|g| g.proxy_wallet == "0xb").unwrap();
        let ids: Vec<&str> = b.trades.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "5"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let trades = vec![
            make_trade("1", "0xfirst", None, dec!(1), dec!(5)),
            make_trade("2", "0xsecond", None, dec!(1), dec!(5)),
            make_trade("3", "0xthird", None, dec!(1), dec!(5)),
        ];
        let wallets: Vec<String> = group_trades(trades)
            .into_iter()
            .map(|g| g.proxy_wallet)
            .collect();
        assert_eq!(wallets, vec!["0xfirst", "0xsecond", "0xthird"]);
    }

    #[test]
    fn test_summary_totals() {
        let summary = summarize(&group_trades(sample()));
        assert_eq!(summary.total_trades, 5);
        assert_eq!(summary.traders, 3);
        assert_eq!(summary.total_invested, dec!(215.25));
        assert_eq!(summary.total_realized_pnl, dec!(34.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(group_trades(Vec::new()).is_empty());
        let summary = summarize(&[]);
        assert_eq!(summary.total_realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let good = TradeRecord {
            id: "1".into(),
            proxy_wallet: "0xa".into(),
            label: None,
            condition_id: "c".into(),
            asset_id: None,
            title: None,
            invested_amount: "10".into(),
            realized_pnl: "1".into(),
            status: "OPEN".into(),
            timestamp: None,
            created_at: None,
        };
        let bad = TradeRecord {
            id: "2".into(),
            realized_pnl: "not a number".into(),
            ..good.clone()
        };
        let trades = trades_from_records(vec![good, bad]);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, "1");
    }

    #[test]
    fn test_smart_wallets_ranked_by_profit() {
        let record = |address: &str, profit: Option<f64>| SmartWalletRecord {
            address: address.into(),
            label: Some("tag".into()),
            total_trades: 1,
            total_profit: profit,
            avg_profit_per_trade: None,
            avg_profit_rate: None,
            win_rate: None,
            avg_total_profit: None,
            top5_profit_ratio: None,
            top10_profit_ratio: None,
            top5_loss_ratio: None,
            top10_loss_ratio: None,
            updated_at: None,
        };
        let ranked = rank_smart_wallets(vec![
            record("0xlow", Some(-3.0)),
            record("0xnone", None),
            record("0xhigh", Some(120.0)),
        ]);
        let order: Vec<&str> = ranked.iter().map(|w| w.address.as_str()).collect();
        assert_eq!(order, vec!["0xhigh", "0xlow"]);
    }
}
