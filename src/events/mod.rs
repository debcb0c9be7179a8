use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
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

// The events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(i64),
    OrderUpdated(i64),
    OrderDeleted(i64),
    CustomerServed { customer_id: i64, order_id: i64 },
}

/// Processes incoming events from the channel until all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated(order_id) => {
                if let Err(e) = handle_order_created(order_id).await {
                    error!(
                        "Failed to handle order created event: order_id={}, error={}",
                        order_id, e
                    );
                }
            }
            Event::OrderUpdated(order_id) => {
                info!(order_id = order_id, "Order updated");
            }
            Event::OrderDeleted(order_id) => {
                info!(order_id = order_id, "Order deleted");
            }
            Event::CustomerServed {
                customer_id,
                order_id,
            } => {
                info!(
                    customer_id = customer_id,
                    order_id = order_id,
                    "Customer marked as served by zero-amount pre-sale"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

async fn handle_order_created(order_id: i64) -> Result<(), String> {
    info!(order_id = order_id, "Order created");
    Ok(())
}
