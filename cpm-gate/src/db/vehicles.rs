//! Vehicle store: write-through cache over the vehicles table
//!
//! Reads prefer the in-memory cache (loaded wholesale at startup); writes
//! update the database first and the cache only after the database has
//! accepted the change, per key. Each vehicle is independent, so no
//! cross-key transactions are needed.

use cpm_common::db::models::{ParkingTicket, VehicleRecord};
use cpm_common::{time, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache-fronted durable storage of vehicle records
pub struct VehicleStore {
    pool: SqlitePool,
    cache: RwLock<HashMap<i64, VehicleRecord>>,
}

impl VehicleStore {
    /// Open the store over an initialized pool and load the cache
    pub async fn open(pool: SqlitePool) -> Result<Self> {
        let store = Self {
            pool,
            cache: RwLock::new(HashMap::new()),
        };
        store.reload_cache().await?;
        Ok(store)
    }

    /// Refresh the whole cache from the database
    async fn reload_cache(&self) -> Result<()> {
        let rows = sqlx::query("SELECT id, plate_number, entry_time, exit_time FROM vehicles")
            .fetch_all(&self.pool)
            .await?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in &rows {
            let record = record_from_row(row)?;
            map.insert(record.id, record);
        }

        debug!("Vehicle cache loaded: {} records", map.len());
        *self.cache.write().await = map;
        Ok(())
    }

    /// Lookup by id: cache first, database on miss
    pub async fn find_by_id(&self, id: i64) -> Result<Option<VehicleRecord>> {
        if let Some(record) = self.cache.read().await.get(&id) {
            return Ok(Some(record.clone()));
        }

        let row = sqlx::query("SELECT id, plate_number, entry_time, exit_time FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Case-insensitive plate lookup, projected to a checkout ticket.
    /// First match wins.
    pub async fn find_ticket_by_plate(&self, plate: &str) -> Option<ParkingTicket> {
        self.cache
            .read()
            .await
            .values()
            .find(|r| r.plate_number.eq_ignore_ascii_case(plate))
            .map(VehicleRecord::ticket)
    }

    /// Snapshot of all known records, ordered by id
    pub async fn find_all(&self) -> Vec<VehicleRecord> {
        let mut records: Vec<VehicleRecord> = self.cache.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Upsert a record: an id already present in the database updates in
    /// place, otherwise the row is inserted and the generated id adopted.
    /// Returns the stored id; the cache is updated only after the database
    /// accepted the write.
    pub async fn save(&self, record: &VehicleRecord) -> Result<i64> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM vehicles WHERE id = ?")
            .bind(record.id)
            .fetch_optional(&self.pool)
            .await?;

        let id = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE vehicles SET plate_number = ?, entry_time = ?, exit_time = ? WHERE id = ?",
                )
                .bind(&record.plate_number)
                .bind(time::format_db(record.entry_time))
                .bind(record.exit_time.map(time::format_db))
                .bind(id)
                .execute(&self.pool)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO vehicles (plate_number, entry_time, exit_time) VALUES (?, ?, ?)",
                )
                .bind(&record.plate_number)
                .bind(time::format_db(record.entry_time))
                .bind(record.exit_time.map(time::format_db))
                .execute(&self.pool)
                .await?;
                result.last_insert_rowid()
            }
        };

        let stored = VehicleRecord {
            id,
            plate_number: record.plate_number.clone(),
            entry_time: record.entry_time,
            exit_time: record.exit_time,
        };
        self.cache.write().await.insert(id, stored);

        Ok(id)
    }

    /// Delete a record and evict it from the cache
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.cache.write().await.remove(&id);
        Ok(())
    }

    /// Highest id currently stored, 0 when the table is empty
    pub async fn max_id(&self) -> Result<i64> {
        let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM vehicles")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }
}

/// Decode one vehicles row, parsing the fixed TEXT datetime encoding
fn record_from_row(row: &SqliteRow) -> Result<VehicleRecord> {
    let entry_time: String = row.get("entry_time");
    let exit_time: Option<String> = row.get("exit_time");

    Ok(VehicleRecord {
        id: row.get("id"),
        plate_number: row.get("plate_number"),
        entry_time: time::parse_db(&entry_time)?,
        exit_time: exit_time.as_deref().map(time::parse_db).transpose()?,
    })
}
