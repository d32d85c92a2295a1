use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted after a mutation commits. Consumers are in-process
/// only; delivery is best-effort and never part of the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // IGP ledger events
    IgpCreated(Uuid),
    IgpDeleted(Uuid),
    IgpTransactionRecorded {
        transaction_id: Uuid,
        igp_id: Uuid,
        quantity: i32,
    },
    IgpTransactionUpdated(Uuid),
    IgpTransactionDeleted(Uuid),
    IgpSupplyRestocked {
        supply_id: Uuid,
        igp_id: Uuid,
        quantity: i32,
    },
    IgpSupplyAdjusted(Uuid),
    IgpSupplyDeleted(Uuid),

    // Water vendo events
    WaterSupplyLogged {
        supply_id: Uuid,
        vendo_id: Uuid,
        gallons: i32,
    },
    WaterSupplyAdjusted(Uuid),
    WaterSupplyDeleted(Uuid),

    // Fund request workflow events
    FundRequestCreated(Uuid),
    FundRequestAdvanced {
        request_id: Uuid,
        from_step: i16,
        to_step: i16,
    },
    FundRequestRejected {
        request_id: Uuid,
        step: i16,
    },
    FundRequestValidated(Uuid),
    ExpenseRecorded {
        expense_id: Uuid,
        request_id: Uuid,
        amount: Decimal,
    },
    ExpenseUpdated(Uuid),
    ExpenseDeleted(Uuid),

    // Locker occupancy events
    RentalCreated(Uuid),
    RentalUpdated(Uuid),
    RentalDeleted(Uuid),
    LockerStatusChanged {
        locker_id: Uuid,
        old_status: String,
        new_status: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes domain events off the channel until all senders drop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::FundRequestAdvanced {
                request_id,
                from_step,
                to_step,
            } => {
                info!(%request_id, from_step, to_step, "fund request advanced");
            }
            Event::FundRequestRejected { request_id, step } => {
                info!(%request_id, step, "fund request rejected");
            }
            Event::FundRequestValidated(request_id) => {
                info!(%request_id, "fund request validated");
            }
            Event::LockerStatusChanged {
                locker_id,
                old_status,
                new_status,
            } => {
                info!(%locker_id, old_status, new_status, "locker status changed");
            }
            other => debug!(event = ?other, "domain event"),
        }
    }
    debug!("event channel closed; processor exiting");
}
