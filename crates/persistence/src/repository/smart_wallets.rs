//! Smart wallet repository

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A persisted smart wallet performance row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SmartWalletRecord {
    pub address: String,
    pub label: Option<String>,
    pub total_trades: i64,
    pub total_profit: Option<f64>,
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

pub struct SmartWalletRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SmartWalletRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All wallets, most profitable first
    pub async fn get_all(&self) -> DbResult<Vec<SmartWalletRecord>> {
        let records = sqlx::query_as::<_, SmartWalletRecord>(
            "SELECT * FROM smart_wallets ORDER BY total_profit DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Upsert by address
    pub async fn save(&self, record: &SmartWalletRecord) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO smart_wallets
                (address, label, total_trades, total_profit, avg_profit_per_trade,
                 avg_profit_rate, win_rate, avg_total_profit, top5_profit_ratio,
                 top10_profit_ratio, top5_loss_ratio, top10_loss_ratio, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
               ON CONFLICT(address) DO UPDATE SET
                 label = excluded.label,
                 total_trades = excluded.total_trades,
                 total_profit = excluded.total_profit,
                 avg_profit_per_trade = excluded.avg_profit_per_trade,
                 avg_profit_rate = excluded.avg_profit_rate,
                 win_rate = excluded.win_rate,
                 avg_total_profit = excluded.avg_total_profit,
                 top5_profit_ratio = excluded.top5_profit_ratio,
                 top10_profit_ratio = excluded.top10_profit_ratio,
                 top5_loss_ratio = excluded.top5_loss_ratio,
                 top10_loss_ratio = excluded.top10_loss_ratio,
                 updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.address)
        .bind(&record.label)
        .bind(record.total_trades)
        .bind(record.total_profit)
        .bind(record.avg_profit_per_trade)
        .bind(record.avg_profit_rate)
        .bind(record.win_rate)
        .bind(record.avg_total_profit)
        .bind(record.top5_profit_ratio)
        .bind(record.top10_profit_ratio)
        .bind(record.top5_loss_ratio)
        .bind(record.top10_loss_ratio)
        .bind(&record.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
