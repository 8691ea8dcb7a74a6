//! Copy-trading repository — mirrored fills per followed wallet

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A persisted copy trade. Amounts are Decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    pub id: String,
    pub proxy_wallet: String,
    pub label: Option<String>,
    pub condition_id: String,
    pub asset_id: Option<String>,
    pub title: Option<String>,
    pub invested_amount: String,
    pub realized_pnl: String,
    pub status: String,
    pub timestamp: Option<String>,
    pub created_at: Option<i64>,
}

/// Repository for copy trades
pub struct TradeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TradeRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All trades, most recent first (NULL timestamps last)
    pub async fn get_all(&self) -> DbResult<Vec<TradeRecord>> {
        let records = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades ORDER BY timestamp IS NULL, timestamp DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Insert or replace a trade (upsert by id)
    pub async fn save(&self, record: &TradeRecord) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO trades
                (id, proxy_wallet, label, condition_id, asset_id, title,
                 invested_amount, realized_pnl, status, timestamp)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(id) DO UPDATE SET
                 label = excluded.label,
                 title = excluded.title,
                 invested_amount = excluded.invested_amount,
                 realized_pnl = excluded.realized_pnl,
                 status = excluded.status,
                 timestamp = excluded.timestamp
            "#,
        )
        .bind(&record.id)
        .bind(&record.proxy_wallet)
        .bind(&record.label)
        .bind(&record.condition_id)
        .bind(&record.asset_id)
        .bind(&record.title)
        .bind(&record.invested_amount)
        .bind(&record.realized_pnl)
        .bind(&record.status)
        .bind(&record.timestamp)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
