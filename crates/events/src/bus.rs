//! Event publication abstraction (mechanics only).
//!
//! The publisher is the seam between the company mutation pipeline and
//! whatever message transport carries domain events out of the process
//! (Redis pub/sub in production, an in-memory fan-out in dev/tests).
//!
//! ## Delivery contract
//!
//! - **At most one attempt per mutation**: callers publish once, with no retry
//!   and no buffering.
//! - **No ordering guarantee across topics**.
//! - **Failure is non-fatal to the caller**: the mutation is already committed
//!   when publication runs, so a publish error is reported, never compensated.
//!
//! Consumers downstream of the transport must therefore tolerate both gaps
//! and duplicates.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::EventEnvelope;

#[derive(Debug, Error)]
pub enum PublishError {
    /// The envelope could not be encoded for the wire.
    #[error("failed to serialize event: {0}")]
    Serialize(String),

    /// The transport rejected or failed to deliver the message.
    #[error("event transport error: {0}")]
    Transport(String),

    /// Internal state of the publisher is unusable (e.g. lock poisoning).
    #[error("publisher unavailable: {0}")]
    Unavailable(String),
}

/// Publish capability: `publish(topic, event)`.
///
/// Implementations must be safe to share across concurrently running
/// requests (`Send + Sync`); any connection pooling is their own concern.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> Result<(), PublishError>;
}

#[async_trait]
impl<P> EventPublisher for Arc<P>
where
    P: EventPublisher + ?Sized,
{
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> Result<(), PublishError> {
        (**self).publish(topic, event).await
    }
}

/// A message as seen by an in-process subscriber: the topic plus its envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub envelope: EventEnvelope,
}

/// A subscription to an in-process event stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Designed for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}
