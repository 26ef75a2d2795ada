use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Events published by the services after a successful commit. The
/// channel is drained by [`process_events`]; a full or closed channel is
/// logged and never fails the publishing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Sales events
    SaleCreated(Uuid),
    SaleDeleted(Uuid),
    StockDecremented {
        product_id: Uuid,
        quantity: i32,
        remaining: i32,
    },

    // Cart events
    CartLineAdded {
        line_id: Uuid,
        product_id: Uuid,
    },
    CartLineUpdated(Uuid),
    CartLineRemoved(Uuid),
    CartConverted {
        sale_id: Uuid,
        line_count: usize,
    },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),

    // Kanban events
    BoardCreated(Uuid),
    BoardUpdated(Uuid),
    BoardDeleted(Uuid),
    ColumnCreated {
        board_id: Uuid,
        column_id: Uuid,
    },
    CardCreated {
        board_id: Uuid,
        card_id: Uuid,
    },
    CardUpdated(Uuid),
    CardMoved {
        card_id: Uuid,
        from_column_id: Uuid,
        to_column_id: Uuid,
    },
    NotificationAttempted {
        card_id: Uuid,
        rule_id: Uuid,
        sent: bool,
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

    /// Sends an event, failing if the channel is closed.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// unavailable. Services call this after commit so event delivery
    /// can never roll back completed work.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "Dropping event");
        }
    }
}

/// Drains the event channel. Currently the events only feed the log;
/// the channel exists so follow-on consumers (webhooks, audit sinks)
/// can attach without touching the services.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        debug!(?event, "Processing event");
    }
    debug!("Event channel closed; processor exiting");
}
