//! Daily market-cap ceiling repository

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Peak market cap of a launched token. Every column except the address
/// may be NULL upstream.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MarketCapRecord {
    pub address: String,
    pub short_name: Option<String>,
    pub create_date_ms: Option<i64>,
    pub max_market_cap_wan: Option<f64>,
    pub is_eligible: Option<bool>,
    pub is_binance: Option<bool>,
}

pub struct MarketCapRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MarketCapRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Eligible launches created at or after `cutoff_ms`, oldest first
    pub async fn get_eligible_since(&self, cutoff_ms: i64) -> DbResult<Vec<MarketCapRecord>> {
        let records = sqlx::query_as::<_, MarketCapRecord>(
            r#"SELECT address, short_name, create_date_ms, max_market_cap_wan, is_eligible, is_binance
               FROM daily_market_cap_ceiling
               WHERE create_date_ms >= ?1 AND is_eligible = 1
               ORDER BY create_date_ms ASC"#,
        )
        .bind(cutoff_ms)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    pub async fn save(&self, record: &MarketCapRecord) -> DbResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO daily_market_cap_ceiling
                (address, short_name, create_date_ms, max_market_cap_wan, is_eligible, is_binance)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(&record.address)
        .bind(&record.short_name)
        .bind(record.create_date_ms)
        .bind(record.max_market_cap_wan)
        .bind(record.is_eligible)
        .bind(record.is_binance)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
