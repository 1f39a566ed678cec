//! End-to-end gate flow over a real database file
//!
//! Drives the entry and checkout workflows against a SQLite database
//! created through the normal initialization path.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::mpsc;

use cpm_common::db::init_database;
use cpm_common::events::GateEvent;
use cpm_common::Error;
use cpm_gate::db::VehicleStore;
use cpm_gate::workflows::{CheckoutWorkflow, EntryWorkflow};

fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

async fn setup() -> (
    Arc<VehicleStore>,
    EntryWorkflow,
    CheckoutWorkflow,
    mpsc::UnboundedReceiver<GateEvent>,
    tempfile::TempDir,
) {
    let tmp = tempfile::tempdir().unwrap();
    let pool = init_database(&tmp.path().join("cpm.db")).await.unwrap();
    let store = Arc::new(VehicleStore::open(pool).await.unwrap());

    let (tx, rx) = mpsc::unbounded_channel();
    let entry = EntryWorkflow::new(Arc::clone(&store), tx.clone());
    let checkout = CheckoutWorkflow::new(Arc::clone(&store), tx);

    (store, entry, checkout, rx, tmp)
}

#[tokio::test]
async fn test_full_stay_entry_fee_exit() {
    let (store, entry, checkout, mut rx, _tmp) = setup().await;

    // Vehicle enters at 08:00, planning to leave at 10:00
    let record = entry
        .register("1-ABC-123", Some(ts(1, 8, 0)), Some(ts(1, 10, 0)))
        .await
        .unwrap();
    assert_eq!(record.id, 1);

    // Checkout at the planned time: two billed hours, no surcharge
    let ticket = checkout.lookup("1-abc-123").await.unwrap();
    let fee = checkout.compute_fee(&ticket, ts(1, 10, 0)).unwrap();
    assert_eq!(fee, 4.0);

    let ticket = checkout
        .record_departure(&ticket, ts(1, 10, 0))
        .await
        .unwrap();
    let receipt = checkout.finalize_exit(&ticket, ts(1, 10, 0)).await.unwrap();
    assert!(receipt.contains("Duration: 120 minutes"));
    assert!(receipt.contains("Total due: 4.00€"));

    // The vehicle is gone from the store
    assert!(store.find_by_id(record.id).await.unwrap().is_none());
    assert!(store.find_all().await.is_empty());

    // Foreground saw the whole lifecycle
    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    assert_eq!(
        names,
        vec!["VehicleRegistered", "ReceiptReady", "VehicleDeparted"]
    );
}

#[tokio::test]
async fn test_reentry_allowed_after_departure() {
    let (_store, entry, checkout, _rx, _tmp) = setup().await;

    entry
        .register("1-ABC-123", Some(ts(1, 8, 0)), None)
        .await
        .unwrap();

    // Still inside: duplicate entry rejected
    assert!(matches!(
        entry.register("1-ABC-123", Some(ts(1, 9, 0)), None).await,
        Err(Error::DuplicateVehicle(_))
    ));

    let ticket = checkout.lookup("1-ABC-123").await.unwrap();
    checkout.finalize_exit(&ticket, ts(1, 12, 0)).await.unwrap();

    // Departed: the same plate may enter again, with a fresh id
    let again = entry
        .register("1-ABC-123", Some(ts(2, 8, 0)), None)
        .await
        .unwrap();
    assert_eq!(again.id, 2);
}

#[tokio::test]
async fn test_late_departure_scenario_against_planned_exit() {
    let (_store, entry, checkout, _rx, _tmp) = setup().await;

    // Planned exit one hour after entry; actual departure 25 hours late
    entry
        .register("1-ABC-123", Some(ts(1, 8, 0)), Some(ts(1, 9, 0)))
        .await
        .unwrap();

    let ticket = checkout.lookup("1-ABC-123").await.unwrap();
    let fee = checkout.compute_fee(&ticket, ts(2, 10, 0)).unwrap();
    // 1h base (2.0) + two complete 12h late blocks (20.0)
    assert_eq!(fee, 22.0);
}
