//! In-memory event bus for tests/dev.

use std::sync::{Mutex, mpsc};

use async_trait::async_trait;

use crate::bus::{EventPublisher, PublishError, Published, Subscription};
use crate::envelope::EventEnvelope;

/// In-memory pub/sub bus.
///
/// - No IO
/// - Best-effort fan-out to every live subscriber
/// - Publishing with no subscribers succeeds and drops the message
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    subscribers: Mutex<Vec<mpsc::Sender<Published>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription<Published> {
        let (tx, rx) = mpsc::channel();

        // A poisoned lock still hands back a subscription; it just never receives.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> Result<(), PublishError> {
        let message = Published {
            topic: topic.to_string(),
            envelope: event.clone(),
        };

        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| PublishError::Unavailable("in-memory bus lock poisoned".to_string()))?;

        // Drop any dead subscribers while publishing.
        subs.retain(|tx| tx.send(message.clone()).is_ok());

        Ok(())
    }
}
