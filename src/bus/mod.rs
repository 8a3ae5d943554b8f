//! Message bus façade (C3): subject publish, subscribe, and request/reply
//! with a timeout, over `async-nats` (present in the retrieval pack's
//! dependency set, e.g. `midnightntwrk-midnight-indexer`).

pub mod memory;
pub mod nats_bus;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::BusError;

#[derive(Debug, Clone)]
pub struct BusMessage {
    pub subject: String,
    pub reply_to: Option<String>,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    async fn subscribe(&self, subject: &str) -> Result<BoxStream<'static, BusMessage>, BusError>;

    /// Publish `payload` to `subject` with a fresh reply inbox, then wait up
    /// to `timeout` for exactly one reply (spec.md §4.6 delivery handler).
    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Option<BusMessage>, BusError>;
}

pub use memory::InMemoryMessageBus;
pub use nats_bus::NatsMessageBus;
