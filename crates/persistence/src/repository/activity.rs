//! Activity profile repository — hourly posting probability per handle

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityProfileRecord {
    pub handle: String,
    pub hour: i64,
    pub day_of_week: i64,
    pub category: String,
    pub probability: f64,
}

pub struct ActivityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ActivityRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Rows for the given handles on one weekday (0 = Monday) and one
    /// category (`all`, `post`, `retweet`), ordered by hour
    pub async fn get_profiles(
        &self,
        handles: &[String],
        day_of_week: u32,
        category: &str,
    ) -> DbResult<Vec<ActivityProfileRecord>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT handle, hour, day_of_week, category, probability \
             FROM user_activity_profiles WHERE day_of_week = ",
        );
        qb.push_bind(i64::from(day_of_week));
        qb.push(" AND category = ");
        qb.push_bind(category);
        qb.push(" AND handle IN (");
        let mut separated = qb.separated(", ");
        for handle in handles {
            separated.push_bind(handle);
        }
        separated.push_unseparated(") ORDER BY hour ASC");

        let records = qb
            .build_query_as::<ActivityProfileRecord>()
            .fetch_all(self.pool)
            .await?;

        Ok(records)
    }

    pub async fn save(&self, record: &ActivityProfileRecord) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO user_activity_profiles (handle, hour, day_of_week, category, probability)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(handle, hour, day_of_week, category) DO UPDATE SET
                 probability = excluded.probability
            "#,
        )
        .bind(&record.handle)
        .bind(record.hour)
        .bind(record.day_of_week)
        .bind(&record.category)
        .bind(record.probability)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
