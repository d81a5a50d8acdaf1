use crate::state::Entity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sending half of the event stream: one item per host whose poll produced
/// a non-empty change set. Consumers read fields through the live entity.
pub type EventSender = mpsc::Sender<Arc<Entity>>;

/// Receiving half of the event stream
pub type EventReceiver = mpsc::Receiver<Arc<Entity>>;

/// What the scheduler does when the event channel has no free capacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Wait for capacity. A stalled consumer stalls polling.
    #[default]
    Block,
    /// Drop the event (counted in the poll status) and keep polling.
    DropWhenFull,
}

/// Outcome of delivering one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    Dropped,
    Closed,
}

/// Bounded event channel. A zero buffer is raised to one, the smallest
/// capacity tokio supports.
pub fn event_channel(buffer: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(buffer.max(1))
}

impl DeliveryPolicy {
    pub(crate) async fn deliver(&self, events: &EventSender, entity: Arc<Entity>) -> Delivery {
        match self {
            DeliveryPolicy::Block => match events.send(entity).await {
                Ok(()) => Delivery::Sent,
                Err(_) => Delivery::Closed,
            },
            DeliveryPolicy::DropWhenFull => match events.try_send(entity) {
                Ok(()) => Delivery::Sent,
                Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
                Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
            },
        }
    }
}
