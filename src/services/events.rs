use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{RequestHandler, Service};
use crate::models::events::DomainEvent;

/// Best-effort publisher for domain events. A full channel or a dropped
/// consumer is logged and otherwise ignored; the mutation that produced the
/// event stands either way.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<DomainEvent>,
}

impl EventPublisher {
    pub fn new(tx: mpsc::Sender<DomainEvent>) -> Self {
        EventPublisher { tx }
    }

    pub fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.tx.try_send(event) {
            log::warn!("Event publish failed: {}", e);
        }
    }
}

/// Stand-in for the external event bus bridge: serializes each event and
/// hands it to the log.
#[derive(Clone)]
pub struct EventRelayHandler;

impl EventRelayHandler {
    pub fn new() -> Self {
        EventRelayHandler {}
    }
}

#[async_trait]
impl RequestHandler<DomainEvent> for EventRelayHandler {
    async fn handle_request(&self, event: DomainEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => log::info!("Domain event: {}", payload),
            Err(e) => log::error!("Could not serialize domain event: {}", e),
        }
    }
}

pub struct EventRelayService;

impl EventRelayService {
    pub fn new() -> Self {
        EventRelayService {}
    }
}

#[async_trait]
impl Service<DomainEvent, EventRelayHandler> for EventRelayService {}
