use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Audience groups for notification side effects. Delivery itself is an
/// external collaborator; the engine only records the intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NotificationAudience {
    Supervisors,
    Requester(Uuid),
    Storekeepers,
}

/// Events emitted by the engine after a transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Job lifecycle events
    JobCreated(Uuid),
    JobStatusChanged {
        job_id: Uuid,
        old_status: String,
        new_status: String,
        actor_id: Uuid,
    },
    JobCompleted {
        job_id: Uuid,
        total_cost: Decimal,
    },
    JobClosed {
        job_id: Uuid,
        snapshot_id: Uuid,
    },
    JobCancelled(Uuid),

    // Cost ledger events
    CostRecorded {
        job_id: Uuid,
        entry_id: Uuid,
        cost_type: String,
        amount: Decimal,
        running_total: Decimal,
    },
    PartsIssued {
        job_id: Uuid,
        line_id: Uuid,
        quantity: Decimal,
    },
    PartsReturned {
        job_id: Uuid,
        line_id: Uuid,
        quantity: Decimal,
    },

    // Downtime events
    DowntimeStarted {
        asset_id: Uuid,
        downtime_log_id: Uuid,
        category: String,
    },
    DowntimeEnded {
        asset_id: Uuid,
        downtime_log_id: Uuid,
        duration_minutes: i64,
    },

    // Meter / PM events
    MeterReadingRecorded {
        asset_id: Uuid,
        reading: Decimal,
    },
    MeterRollbackDetected {
        asset_id: Uuid,
        previous: Decimal,
        reported: Decimal,
        alert_id: Uuid,
    },
    PmJobGenerated {
        schedule_id: Uuid,
        job_id: Uuid,
    },

    // Notification intents
    NotificationRequested {
        audience: NotificationAudience,
        subject: String,
        body: String,
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

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes engine events. Notification intents and alerts are logged here;
/// a delivery integration subscribes in deployments that need one.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::NotificationRequested {
                audience, subject, ..
            } => {
                info!(?audience, %subject, "notification requested");
            }
            Event::MeterRollbackDetected {
                asset_id,
                previous,
                reported,
                ..
            } => {
                warn!(%asset_id, %previous, %reported, "meter rollback detected");
            }
            _ => {
                info!(?event, "event processed");
            }
        }
    }
    info!("Event channel closed; processor exiting");
}
