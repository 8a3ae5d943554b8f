use std::time::Duration;

use async_nats::Client;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;

use crate::errors::BusError;

use super::{BusMessage, MessageBus};

#[derive(Clone)]
pub struct NatsMessageBus {
    client: Client,
}

impl NatsMessageBus {
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MessageBus for NatsMessageBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<BoxStream<'static, BusMessage>, BusError> {
        let sub = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        let stream = sub.map(|m| BusMessage {
            subject: m.subject.to_string(),
            reply_to: m.reply.map(|r| r.to_string()),
            payload: m.payload.to_vec(),
        });
        Ok(Box::pin(stream))
    }

    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Option<BusMessage>, BusError> {
        // A dedicated inbox + sync subscribe + auto-unsubscribe(1), matching
        // spec.md §4.6's "new inbox subject, subscribe sync, auto-unsubscribe
        // after one" rather than the client's built-in `request()` (which
        // does not expose the unconsumed-reply distinction from a timeout).
        let inbox = self.client.new_inbox();
        let mut sub = self
            .client
            .subscribe(inbox.clone())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        sub.unsubscribe_after(1)
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        self.client
            .publish_with_reply(subject.to_string(), inbox, payload.into())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        match tokio::time::timeout(timeout, sub.next()).await {
            Ok(Some(msg)) => Ok(Some(BusMessage {
                subject: msg.subject.to_string(),
                reply_to: msg.reply.map(|r| r.to_string()),
                payload: msg.payload.to_vec(),
            })),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }
}
