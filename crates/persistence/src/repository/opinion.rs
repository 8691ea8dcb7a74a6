//! Opinion arbitrage repository — raw event documents in insertion order

use crate::DbResult;
use sqlx::SqlitePool;

pub struct OpinionArbitrageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OpinionArbitrageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// `raw_data` of every event, oldest row first
    pub async fn get_raw_events(&self) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT raw_data FROM opinion_arbitrage ORDER BY id ASC")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|(raw,)| raw).collect())
    }

    /// Replace the whole event set in one transaction. Returns rows written.
    pub async fn replace_all(&self, raw_events: &[String]) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM opinion_arbitrage")
            .execute(&mut *tx)
            .await?;
        for raw in raw_events {
            sqlx::query("INSERT INTO opinion_arbitrage (raw_data) VALUES (?1)")
                .bind(raw)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(raw_events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_replace_all_keeps_insertion_order() {
        let db = Database::in_memory().await.unwrap();
        let repo = OpinionArbitrageRepository::new(db.pool());

        repo.replace_all(&["{\"event_title\":\"old\"}".to_string()])
            .await
            .unwrap();
        let written = repo
            .replace_all(&["{\"n\":2}".to_string(), "{\"n\":1}".to_string()])
            .await
            .unwrap();
        assert_eq!(written, 2);

        let raw = repo.get_raw_events().await.unwrap();
        assert_eq!(raw, vec!["{\"n\":2}", "{\"n\":1}"]);
    }
}
