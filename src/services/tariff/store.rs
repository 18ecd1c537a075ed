//! Tariff persistence
//!
//! Uses PostgreSQL in production, an in-memory map for tests and offline runs.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::db::queries;
use crate::types::{TariffConfigSnapshot, TariffRow};

/// Keyed tariff table plus the singleton calibration snapshot
#[async_trait]
pub trait TariffStore: Send + Sync {
    /// Atomically replace the whole table with `rows` (upsert by distance,
    /// drop distances past the new maximum) and, if given, the snapshot.
    /// Returns the number of rows written.
    async fn replace_table(
        &self,
        rows: &[TariffRow],
        snapshot: Option<&TariffConfigSnapshot>,
    ) -> Result<usize>;

    async fn get_snapshot(&self) -> Result<Option<TariffConfigSnapshot>>;

    async fn get_row(&self, distance_km: i32) -> Result<Option<TariffRow>>;

    /// Rows with `from_km <= distance_km <= to_km`, ordered by distance
    async fn list_rows(&self, from_km: i32, to_km: i32) -> Result<Vec<TariffRow>>;

    /// Get store name for logging
    fn name(&self) -> &str;
}

/// PostgreSQL-backed store
pub struct PgTariffStore {
    pool: PgPool,
    batch_size: usize,
}

impl PgTariffStore {
    pub fn new(pool: PgPool, batch_size: usize) -> Self {
        Self { pool, batch_size }
    }
}

#[async_trait]
impl TariffStore for PgTariffStore {
    async fn replace_table(
        &self,
        rows: &[TariffRow],
        snapshot: Option<&TariffConfigSnapshot>,
    ) -> Result<usize> {
        queries::transport_tariff::replace_tariff_table(&self.pool, rows, snapshot, self.batch_size).await
    }

    async fn get_snapshot(&self) -> Result<Option<TariffConfigSnapshot>> {
        queries::transport_tariff::get_config_snapshot(&self.pool).await
    }

    async fn get_row(&self, distance_km: i32) -> Result<Option<TariffRow>> {
        queries::transport_tariff::get_tariff(&self.pool, distance_km).await
    }

    async fn list_rows(&self, from_km: i32, to_km: i32) -> Result<Vec<TariffRow>> {
        queries::transport_tariff::list_tariffs(&self.pool, from_km, to_km).await
    }

    fn name(&self) -> &str {
        "Postgres"
    }
}

#[derive(Default)]
struct MemoryState {
    rows: BTreeMap<i32, TariffRow>,
    snapshot: Option<TariffConfigSnapshot>,
}

/// In-memory store. Replacement builds the new state first and swaps it in
/// under the lock, so readers never see a half-written table.
#[derive(Default)]
pub struct MemoryTariffStore {
    state: Mutex<MemoryState>,
}

impl MemoryTariffStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn row_count(&self) -> usize {
        self.state.lock().rows.len()
    }
}

#[async_trait]
impl TariffStore for MemoryTariffStore {
    async fn replace_table(
        &self,
        rows: &[TariffRow],
        snapshot: Option<&TariffConfigSnapshot>,
    ) -> Result<usize> {
        let max_distance_km = rows.iter().map(|r| r.distance_km).max().unwrap_or(0);

        let mut state = self.state.lock();
        let mut next = state.rows.clone();
        for row in rows {
            next.insert(row.distance_km, row.clone());
        }
        next.retain(|distance_km, _| *distance_km <= max_distance_km);

        state.rows = next;
        if let Some(snapshot) = snapshot {
            state.snapshot = Some(snapshot.clone());
        }
        Ok(rows.len())
    }

    async fn get_snapshot(&self) -> Result<Option<TariffConfigSnapshot>> {
        Ok(self.state.lock().snapshot.clone())
    }

    async fn get_row(&self, distance_km: i32) -> Result<Option<TariffRow>> {
        Ok(self.state.lock().rows.get(&distance_km).cloned())
    }

    async fn list_rows(&self, from_km: i32, to_km: i32) -> Result<Vec<TariffRow>> {
        if from_km > to_km {
            return Ok(vec![]);
        }
        Ok(self
            .state
            .lock()
            .rows
            .range(from_km..=to_km)
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "Memory"
    }
}
