//! Redis pub/sub-backed event publisher.
//!
//! One channel per topic; the message body is the JSON envelope. Redis pub/sub
//! is not durable (messages are dropped if no subscriber is connected), which
//! matches the single-attempt delivery contract of [`EventPublisher`].

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::debug;

use firmhub_events::{EventEnvelope, EventPublisher, PublishError};

/// Publishes JSON event envelopes to Redis channels.
///
/// The multiplexed connection is cheap to clone and safe to share across
/// concurrently running requests.
#[derive(Clone)]
pub struct RedisPubSubPublisher {
    conn: MultiplexedConnection,
}

impl RedisPubSubPublisher {
    /// Open the client and establish the shared connection.
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, PublishError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl core::fmt::Debug for RedisPubSubPublisher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisPubSubPublisher").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventPublisher for RedisPubSubPublisher {
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> Result<(), PublishError> {
        let payload =
            serde_json::to_string(event).map_err(|e| PublishError::Serialize(e.to_string()))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        debug!(topic, receivers, "published to redis channel");
        Ok(())
    }
}
