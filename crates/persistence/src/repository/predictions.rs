//! AI prediction repository — human vs model forecasts per market

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// One prediction snapshot row. Missing JSON fields default to empty so a
/// partial snapshot file still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct PredictionRecord {
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
    pub market_status: Option<String>,
    pub human_price: Option<f64>,
    pub is_excluded: bool,
    pub updated_at: Option<i64>,
}

pub struct PredictionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PredictionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Every prediction, ordered by title
    pub async fn get_all(&self) -> DbResult<Vec<PredictionRecord>> {
        let records = sqlx::query_as::<_, PredictionRecord>(
            "SELECT * FROM ai_predictions ORDER BY title",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Upsert a batch keyed by slug inside one transaction. Returns rows written.
    pub async fn save_all(&self, records: &[PredictionRecord]) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"INSERT INTO ai_predictions
                    (slug, title, question, ai_outcome, ai_reasoning, grok_outcome,
                     grok_reasoning, doubao_outcome, human_outcome, real_outcome,
                     market_status, human_price, is_excluded, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                           strftime('%s', 'now'))
                   ON CONFLICT(slug) DO UPDATE SET
                     title = excluded.title,
                     question = excluded.question,
                     ai_outcome = excluded.ai_outcome,
                     ai_reasoning = excluded.ai_reasoning,
                     grok_outcome = excluded.grok_outcome,
                     grok_reasoning = excluded.grok_reasoning,
                     doubao_outcome = excluded.doubao_outcome,
                     human_outcome = excluded.human_outcome,
                     real_outcome = excluded.real_outcome,
                     market_status = excluded.market_status,
                     human_price = excluded.human_price,
                     is_excluded = excluded.is_excluded,
                     updated_at = strftime('%s', 'now')
                "#,
            )
            .bind(&record.slug)
            .bind(&record.title)
            .bind(&record.question)
            .bind(&record.ai_outcome)
            .bind(&record.ai_reasoning)
            .bind(&record.grok_outcome)
            .bind(&record.grok_reasoning)
            .bind(&record.doubao_outcome)
            .bind(&record.human_outcome)
            .bind(&record.real_outcome)
            .bind(&record.market_status)
            .bind(record.human_price)
            .bind(record.is_excluded)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn prediction(slug: &str, title: &str, status: &str) -> PredictionRecord {
        PredictionRecord {
            slug: slug.into(),
            title: Some(title.into()),
            market_status: Some(status.into()),
            real_outcome: Some("Yes".into()),
            human_outcome: Some("Yes".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_all_orders_by_title() {
        let db = Database::in_memory().await.unwrap();
        let repo = PredictionRepository::new(db.pool());
        let written = repo
            .save_all(&[
                prediction("b", "Beta", "CLOSED"),
                prediction("a", "Alpha", "CLOSED"),
                prediction("c", "Gamma", "OPEN"),
            ])
            .await
            .unwrap();
        assert_eq!(written, 3);

        let all = repo.get_all().await.unwrap();
        let slugs: Vec<&str> = all.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_save_all_upserts_by_slug() {
        let db = Database::in_memory().await.unwrap();
        let repo = PredictionRepository::new(db.pool());
        repo.save_all(&[prediction("a", "Alpha", "OPEN")]).await.unwrap();

        let mut closed = prediction("a", "Alpha", "CLOSED");
        closed.is_excluded = true;
        repo.save_all(&[closed]).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].market_status.as_deref(), Some("CLOSED"));
        assert!(all[0].is_excluded);
    }

    #[test]
    fn test_partial_json_snapshot_deserializes() {
        let json = r#"[{"slug": "x", "ai_outcome": "Yes", "is_excluded": true}]"#;
        let records: Vec<PredictionRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].slug, "x");
        assert!(records[0].is_excluded);
        assert!(records[0].real_outcome.is_none());
    }
}
