//! Prediction and arbitrage data sources
//!
//! Pages receive their sources explicitly. A missing snapshot file yields an
//! empty list rather than an error.

use crate::arbitrage::{ArbitrageEvent, ClosingMarket};
use crate::types::Prediction;
use anyhow::{Context, Result};
use async_trait::async_trait;
use persistence::repository::{OpinionArbitrageRepository, PredictionRecord, PredictionRepository};
use persistence::SqlitePool;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// JSON array from disk; a missing file is an empty list
pub async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Snapshot not found, using empty set");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).with_context(|| format!("reading snapshot {}", path.display())),
    };

    let items: Vec<T> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    debug!(count = items.len(), path = %path.display(), "Snapshot loaded");
    Ok(items)
}

#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Prediction>>;
}

/// Fixed in-memory list; `Default` is empty
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<PredictionRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<PredictionRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl PredictionSource for StaticSource {
    async fn load(&self) -> Result<Vec<Prediction>> {
        Ok(self.records.iter().cloned().map(Prediction::from).collect())
    }
}

/// JSON array snapshot on disk
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Raw records, for importing into the database
    pub async fn read_records(&self) -> Result<Vec<PredictionRecord>> {
        read_json_array(&self.path).await
    }
}

#[async_trait]
impl PredictionSource for SnapshotFileSource {
    async fn load(&self) -> Result<Vec<Prediction>> {
        Ok(self
            .read_records()
            .await?
            .into_iter()
            .map(Prediction::from)
            .collect())
    }
}

/// The `ai_predictions` table
#[derive(Debug, Clone)]
pub struct DatabaseSource {
    pool: SqlitePool,
}

impl DatabaseSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionSource for DatabaseSource {
    async fn load(&self) -> Result<Vec<Prediction>> {
        let records = PredictionRepository::new(&self.pool)
            .get_all()
            .await
            .context("querying ai_predictions")?;
        Ok(records.into_iter().map(Prediction::from).collect())
    }
}

#[async_trait]
pub trait OpinionSource: Send + Sync {
    async fn arbitrage_events(&self) -> Result<Vec<ArbitrageEvent>>;
    async fn closing_markets(&self) -> Result<Vec<ClosingMarket>>;
}

/// Fixed in-memory lists; `Default` is empty
#[derive(Debug, Clone, Default)]
pub struct StaticOpinionSource {
    pub events: Vec<ArbitrageEvent>,
    pub closing: Vec<ClosingMarket>,
}

#[async_trait]
impl OpinionSource for StaticOpinionSource {
    async fn arbitrage_events(&self) -> Result<Vec<ArbitrageEvent>> {
        Ok(self.events.clone())
    }

    async fn closing_markets(&self) -> Result<Vec<ClosingMarket>> {
        Ok(self.closing.clone())
    }
}

/// Arbitrage events from the `opinion_arbitrage` table, falling back to the
/// snapshot file when the table is empty or unreadable. Closing markets only
/// exist as a snapshot.
#[derive(Debug, Clone)]
pub struct OpinionStore {
    pool: SqlitePool,
    arbitrage_snapshot: PathBuf,
    closing_snapshot: PathBuf,
}

impl OpinionStore {
    pub fn new(
        pool: SqlitePool,
        arbitrage_snapshot: impl Into<PathBuf>,
        closing_snapshot: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pool,
            arbitrage_snapshot: arbitrage_snapshot.into(),
            closing_snapshot: closing_snapshot.into(),
        }
    }

    async fn stored_events(&self) -> Result<Vec<ArbitrageEvent>> {
        let raw = OpinionArbitrageRepository::new(&self.pool)
            .get_raw_events()
            .await
            .context("querying opinion_arbitrage")?;

        let mut events = Vec::with_capacity(raw.len());
        for (i, row) in raw.iter().enumerate() {
            match serde_json::from_str::<ArbitrageEvent>(row) {
                Ok(event) => events.push(event),
                Err(e) => warn!(row = i, error = %e, "Skipping unparseable arbitrage row"),
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl OpinionSource for OpinionStore {
    async fn arbitrage_events(&self) -> Result<Vec<ArbitrageEvent>> {
        match self.stored_events().await {
            Ok(events) if !events.is_empty() => return Ok(events),
            Ok(_) => debug!("No stored arbitrage events, reading snapshot"),
            Err(e) => warn!(error = %e, "Arbitrage table unavailable, reading snapshot"),
        }
        read_json_array(&self.arbitrage_snapshot).await
    }

    async fn closing_markets(&self) -> Result<Vec<ClosingMarket>> {
        read_json_array(&self.closing_snapshot).await
    }
}
