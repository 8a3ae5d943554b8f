use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::errors::BusError;

use super::{BusMessage, MessageBus};

/// In-process broadcast-channel-backed bus for unit tests. Subjects are
/// created lazily on first publish or subscribe.
#[derive(Default)]
pub struct InMemoryMessageBus {
    channels: Mutex<HashMap<String, broadcast::Sender<BusMessage>>>,
    inbox_counter: std::sync::atomic::AtomicU64,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, subject: &str) -> broadcast::Sender<BusMessage> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(subject.to_string())
            .or_insert_with(|| broadcast::channel(1024).0)
            .clone()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let tx = self.channel(subject);
        // No subscribers is not an error for a fire-and-forget bus.
        let _ = tx.send(BusMessage {
            subject: subject.to_string(),
            reply_to: None,
            payload,
        });
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<BoxStream<'static, BusMessage>, BusError> {
        let tx = self.channel(subject);
        let rx = tx.subscribe();
        let stream = BroadcastStream::new(rx).filter_map(|r| r.ok());
        Ok(Box::pin(stream))
    }

    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Option<BusMessage>, BusError> {
        let n = self
            .inbox_counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let inbox = format!("_INBOX.{n}");

        let reply_tx = self.channel(&inbox);
        let mut reply_rx = reply_tx.subscribe();

        let tx = self.channel(subject);
        let _ = tx.send(BusMessage {
            subject: subject.to_string(),
            reply_to: Some(inbox),
            payload,
        });

        match tokio::time::timeout(timeout, reply_rx.recv()).await {
            Ok(Ok(msg)) => Ok(Some(msg)),
            Ok(Err(_)) | Err(_) => Ok(None),
        }
    }
}
