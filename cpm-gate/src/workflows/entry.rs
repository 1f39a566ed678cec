//! Entry workflow: plate in, vehicle record persisted
//!
//! Two states per invocation: awaiting plate, then registered. The plate
//! arrives OCR-cleaned and normalized; the workflow enforces the
//! one-active-record-per-plate rule and allocates the next id before
//! persisting.

use chrono::NaiveDateTime;
use cpm_common::db::models::VehicleRecord;
use cpm_common::events::GateEvent;
use cpm_common::{time, Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::db::VehicleStore;
use crate::tasks::emit;

pub struct EntryWorkflow {
    store: Arc<VehicleStore>,
    events: UnboundedSender<GateEvent>,
}

impl EntryWorkflow {
    pub fn new(store: Arc<VehicleStore>, events: UnboundedSender<GateEvent>) -> Self {
        Self { store, events }
    }

    /// Register a vehicle entering the car park.
    ///
    /// `entry_time` defaults to now; `planned_exit` is the operator-entered
    /// planned exit, if any. Fails with [`Error::DuplicateVehicle`] when a
    /// record for the plate already exists (case-insensitive).
    pub async fn register(
        &self,
        plate: &str,
        entry_time: Option<NaiveDateTime>,
        planned_exit: Option<NaiveDateTime>,
    ) -> Result<VehicleRecord> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(Error::InvalidInput("plate must not be empty".to_string()));
        }

        // One active record per plate. Checkout deletes records on
        // departure, so any match means the vehicle is still inside.
        if self.store.find_ticket_by_plate(plate).await.is_some() {
            return Err(Error::DuplicateVehicle(plate.to_string()));
        }

        let record = VehicleRecord {
            id: self.store.max_id().await? + 1,
            plate_number: plate.to_string(),
            entry_time: entry_time.unwrap_or_else(time::now),
            exit_time: planned_exit,
        };

        let id = self.store.save(&record).await?;
        let stored = VehicleRecord { id, ..record };

        info!("Vehicle registered: id={} plate={}", id, stored.plate_number);
        emit(
            &self.events,
            GateEvent::VehicleRegistered {
                id,
                plate: stored.plate_number.clone(),
                timestamp: chrono::Utc::now(),
            },
        );

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::mpsc;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    async fn setup() -> (EntryWorkflow, mpsc::UnboundedReceiver<GateEvent>) {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        cpm_common::db::init::create_schema(&pool).await.unwrap();
        let store = Arc::new(VehicleStore::open(pool).await.unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        (EntryWorkflow::new(store, tx), rx)
    }

    #[tokio::test]
    async fn test_register_allocates_ids_from_one() {
        let (workflow, mut rx) = setup().await;

        let first = workflow
            .register("1-ABC-123", Some(ts(8)), Some(ts(10)))
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.exit_time, Some(ts(10)));

        let second = workflow
            .register("2-DEF-456", Some(ts(9)), None)
            .await
            .unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.exit_time, None);

        assert!(matches!(
            rx.recv().await.unwrap(),
            GateEvent::VehicleRegistered { id: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_plate_case_insensitive() {
        let (workflow, _rx) = setup().await;

        workflow
            .register("1-ABC-123", Some(ts(8)), None)
            .await
            .unwrap();

        let result = workflow.register("1-abc-123", Some(ts(9)), None).await;
        assert!(matches!(result, Err(Error::DuplicateVehicle(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_plate() {
        let (workflow, _rx) = setup().await;

        let result = workflow.register("   ", Some(ts(8)), None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_register_defaults_entry_time_to_now() {
        let (workflow, _rx) = setup().await;

        let before = cpm_common::time::now();
        let record = workflow.register("1-ABC-123", None, None).await.unwrap();
        let after = cpm_common::time::now();

        assert!(record.entry_time >= before && record.entry_time <= after);
    }
}
