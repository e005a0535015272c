//! Transport abstraction
//!
//! The simulator only ever sees [`MessageBus`]. A transport delivers each
//! published payload to every live [`Subscription`] of that channel.

use crate::channel::Channel;
use crate::error::BusError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

/// A payload that belongs to exactly one channel
pub trait BusEvent: Serialize + DeserializeOwned {
    const CHANNEL: Channel;
}

/// A raw message as seen by a subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub channel: Channel,
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

impl BusMessage {
    pub fn new(channel: Channel, payload: String) -> Self {
        Self {
            channel,
            payload,
            received_at: Utc::now(),
        }
    }

    /// Decode the JSON payload as the event type of this channel
    pub fn decode<E: BusEvent>(&self) -> Result<E, BusError> {
        if self.channel != E::CHANNEL {
            return Err(BusError::WrongChannel {
                expected: E::CHANNEL,
                actual: self.channel,
            });
        }
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// Receiving end of a channel subscription
#[derive(Debug)]
pub struct Subscription {
    channel: Channel,
    rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl Subscription {
    pub fn new(channel: Channel, rx: mpsc::UnboundedReceiver<BusMessage>) -> Self {
        Self { channel, rx }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Wait for the next message; `None` once the transport has gone away
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }

    /// Take a message if one is already queued
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        self.rx.try_recv().ok()
    }
}

/// Publish/subscribe transport
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a serialized payload on `channel`
    async fn publish(&self, channel: Channel, payload: String) -> Result<(), BusError>;

    /// Open a subscription that receives every later publish on `channel`
    async fn subscribe(&self, channel: Channel) -> Result<Subscription, BusError>;

    /// Liveness probe used by the health monitor
    async fn ping(&self) -> Result<(), BusError>;
}

/// Serialize `event` and publish it on its channel
pub async fn publish_event<B, E>(bus: &B, event: &E) -> Result<(), BusError>
where
    B: MessageBus + ?Sized,
    E: BusEvent + Sync,
{
    let payload = serde_json::to_string(event)?;
    bus.publish(E::CHANNEL, payload).await
}
