//! Checkout workflow: locate a ticket, compute the fee, record the actual
//! departure, finalize the exit
//!
//! Stateless per invocation; operates over whatever record currently exists
//! for a plate. Dependent steps are sequenced by the caller (lookup before
//! fee, fee before finalize); recording the departure is independent of fee
//! display.

use chrono::NaiveDateTime;
use cpm_common::db::models::{ParkingTicket, VehicleRecord};
use cpm_common::events::GateEvent;
use cpm_common::{fee, Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::info;

use crate::db::VehicleStore;
use crate::tasks::{self, emit};

pub struct CheckoutWorkflow {
    store: Arc<VehicleStore>,
    events: UnboundedSender<GateEvent>,
}

impl CheckoutWorkflow {
    pub fn new(store: Arc<VehicleStore>, events: UnboundedSender<GateEvent>) -> Self {
        Self { store, events }
    }

    /// Case-insensitive ticket lookup; first match wins
    pub async fn lookup(&self, plate: &str) -> Result<ParkingTicket> {
        self.store
            .find_ticket_by_plate(plate)
            .await
            .ok_or_else(|| Error::TicketNotFound(plate.to_string()))
    }

    /// The exit reference used for billing: the planned exit when one was
    /// recorded, otherwise the actual departure stands in for both ends of
    /// the late window. With no planned exit a late surcharge therefore
    /// never accrues; this mirrors the recorded product behavior.
    fn billing_exit(ticket: &ParkingTicket, departure: NaiveDateTime) -> NaiveDateTime {
        ticket.exit_time.unwrap_or(departure)
    }

    /// Compute the fee for a ticket departing at `departure`
    pub fn compute_fee(&self, ticket: &ParkingTicket, departure: NaiveDateTime) -> Result<f64> {
        fee::calculate_fee(
            ticket.entry_time,
            Some(Self::billing_exit(ticket, departure)),
            Some(departure),
        )
    }

    /// Background fee computation with foreground result delivery
    pub fn compute_fee_async(
        &self,
        ticket: &ParkingTicket,
        departure: NaiveDateTime,
    ) -> JoinHandle<Result<f64>> {
        tasks::spawn_calculate_fee(
            ticket.plate_number.clone(),
            ticket.entry_time,
            Some(Self::billing_exit(ticket, departure)),
            Some(departure),
            self.events.clone(),
        )
    }

    /// Persist the actual departure on the ticket's record (update path,
    /// keyed by id). Independent of fee display.
    pub async fn record_departure(
        &self,
        ticket: &ParkingTicket,
        departure: NaiveDateTime,
    ) -> Result<ParkingTicket> {
        let record = VehicleRecord {
            id: ticket.id,
            plate_number: ticket.plate_number.clone(),
            entry_time: ticket.entry_time,
            exit_time: Some(departure),
        };
        self.store.save(&record).await?;
        Ok(record.ticket())
    }

    /// Terminal transition: produce the receipt, then delete the record.
    ///
    /// Compute-then-delete ordering: a summary failure surfaces before the
    /// record is touched, and a delete failure surfaces as an explicit
    /// error instead of silently losing half the operation. The receipt is
    /// only returned for a fully completed exit.
    pub async fn finalize_exit(
        &self,
        ticket: &ParkingTicket,
        departure: NaiveDateTime,
    ) -> Result<String> {
        let summary = tasks::spawn_exit_summary(
            ticket.plate_number.clone(),
            ticket.entry_time,
            Some(Self::billing_exit(ticket, departure)),
            Some(departure),
            self.events.clone(),
        )
        .await
        .map_err(|e| Error::Internal(format!("summary task failed: {}", e)))??;

        self.store.delete(ticket.id).await?;

        info!(
            "Vehicle departed: id={} plate={}",
            ticket.id, ticket.plate_number
        );
        emit(
            &self.events,
            GateEvent::VehicleDeparted {
                id: ticket.id,
                plate: ticket.plate_number.clone(),
                timestamp: chrono::Utc::now(),
            },
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::mpsc;

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    async fn setup() -> (
        Arc<VehicleStore>,
        CheckoutWorkflow,
        mpsc::UnboundedReceiver<GateEvent>,
    ) {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        cpm_common::db::init::create_schema(&pool).await.unwrap();
        let store = Arc::new(VehicleStore::open(pool).await.unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        let workflow = CheckoutWorkflow::new(Arc::clone(&store), tx);
        (store, workflow, rx)
    }

    async fn park(store: &VehicleStore, plate: &str, exit: Option<NaiveDateTime>) -> i64 {
        store
            .save(&VehicleRecord {
                id: store.max_id().await.unwrap() + 1,
                plate_number: plate.to_string(),
                entry_time: ts(1, 8),
                exit_time: exit,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_unknown_plate_fails() {
        let (_store, workflow, _rx) = setup().await;

        let result = workflow.lookup("9-ZZZ-999").await;
        assert!(matches!(result, Err(Error::TicketNotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let (store, workflow, _rx) = setup().await;
        park(&store, "1-ABC-123", None).await;

        let ticket = workflow.lookup("1-abc-123").await.unwrap();
        assert_eq!(ticket.plate_number, "1-ABC-123");
    }

    #[tokio::test]
    async fn test_fee_uses_planned_exit_when_present() {
        let (store, workflow, _rx) = setup().await;
        park(&store, "1-ABC-123", Some(ts(1, 9))).await;

        let ticket = workflow.lookup("1-ABC-123").await.unwrap();
        // Departing 25h after the planned exit: 1h base + 2 surcharge blocks
        let fee = workflow.compute_fee(&ticket, ts(2, 10)).unwrap();
        assert_eq!(fee, 22.0);
    }

    #[tokio::test]
    async fn test_fee_without_planned_exit_never_incurs_surcharge() {
        let (store, workflow, _rx) = setup().await;
        park(&store, "1-ABC-123", None).await;

        let ticket = workflow.lookup("1-ABC-123").await.unwrap();
        // 26h stay: the departure doubles as the exit reference, so the
        // stay bills two days and no late surcharge can apply
        let fee = workflow.compute_fee(&ticket, ts(2, 10)).unwrap();
        assert_eq!(fee, 30.0);
    }

    #[tokio::test]
    async fn test_record_departure_persists_update_in_place() {
        let (store, workflow, _rx) = setup().await;
        let id = park(&store, "1-ABC-123", Some(ts(1, 9))).await;

        let ticket = workflow.lookup("1-ABC-123").await.unwrap();
        let updated = workflow.record_departure(&ticket, ts(1, 11)).await.unwrap();
        assert_eq!(updated.exit_time, Some(ts(1, 11)));

        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.exit_time, Some(ts(1, 11)));
    }

    #[tokio::test]
    async fn test_finalize_exit_returns_receipt_and_deletes_record() {
        let (store, workflow, mut rx) = setup().await;
        park(&store, "1-ABC-123", Some(ts(1, 10))).await;

        let ticket = workflow.lookup("1-ABC-123").await.unwrap();
        let receipt = workflow.finalize_exit(&ticket, ts(1, 10)).await.unwrap();
        assert!(receipt.contains("Duration: 120 minutes"));
        assert!(receipt.contains("Total due: 4.00€"));

        // Terminal transition: the vehicle is no longer parked
        assert!(matches!(
            workflow.lookup("1-ABC-123").await,
            Err(Error::TicketNotFound(_))
        ));

        assert!(matches!(
            rx.recv().await.unwrap(),
            GateEvent::ReceiptReady { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            GateEvent::VehicleDeparted { .. }
        ));
    }

    #[tokio::test]
    async fn test_finalize_exit_propagates_invalid_interval_without_deleting() {
        let (store, workflow, _rx) = setup().await;
        park(&store, "1-ABC-123", Some(ts(1, 10))).await;

        let ticket = workflow.lookup("1-ABC-123").await.unwrap();
        // Planned exit before entry is rejected by the calculator; the
        // record must survive the failed half of the operation
        let bad_ticket = ParkingTicket {
            exit_time: Some(ts(1, 7)),
            ..ticket.clone()
        };
        let result = workflow.finalize_exit(&bad_ticket, ts(1, 7)).await;
        assert!(matches!(result, Err(Error::InvalidInterval(_))));

        assert!(workflow.lookup("1-ABC-123").await.is_ok());
    }

    #[tokio::test]
    async fn test_compute_fee_async_delivers_to_foreground() {
        let (store, workflow, mut rx) = setup().await;
        park(&store, "1-ABC-123", Some(ts(1, 10))).await;

        let ticket = workflow.lookup("1-ABC-123").await.unwrap();
        let fee = workflow
            .compute_fee_async(&ticket, ts(1, 10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fee, 4.0);

        assert!(matches!(
            rx.recv().await.unwrap(),
            GateEvent::FeeCalculated { .. }
        ));
    }
}
