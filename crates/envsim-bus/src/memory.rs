//! In-process bus
//!
//! Used by the CLI when no external broker is configured, and by tests. On
//! top of plain fan-out it keeps a bounded journal of the most recent
//! accepted publishes and supports fault injection so failure paths can be
//! exercised.

use crate::bus::{BusEvent, BusMessage, MessageBus, Subscription};
use crate::channel::Channel;
use crate::error::BusError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug)]
struct Inner {
    subscribers: Mutex<HashMap<Channel, Vec<mpsc::UnboundedSender<BusMessage>>>>,
    journal: Mutex<VecDeque<BusMessage>>,
    journal_capacity: usize,
    pending_failures: Mutex<HashMap<Channel, u32>>,
    reachable: AtomicBool,
}

/// Fan-out bus living entirely inside the process
#[derive(Debug, Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Journal size used by [`InMemoryBus::new`]
pub const DEFAULT_JOURNAL_CAPACITY: usize = 4_096;

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_journal_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// Bus keeping at most `capacity` journal entries; the oldest are
    /// evicted first. A capacity of zero disables the journal.
    pub fn with_journal_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                journal: Mutex::new(VecDeque::new()),
                journal_capacity: capacity,
                pending_failures: Mutex::new(HashMap::new()),
                reachable: AtomicBool::new(true),
            }),
        }
    }

    /// Simulate the broker going away (or coming back)
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.inner.reachable.load(Ordering::SeqCst)
    }

    /// Reject the next `count` publishes on `channel`
    pub fn fail_next(&self, channel: Channel, count: u32) {
        *lock(&self.inner.pending_failures).entry(channel).or_default() += count;
    }

    /// Journaled publishes on `channel`, oldest first
    pub fn published(&self, channel: Channel) -> Vec<BusMessage> {
        lock(&self.inner.journal)
            .iter()
            .filter(|m| m.channel == channel)
            .cloned()
            .collect()
    }

    /// Accepted publishes decoded as their channel's event type.
    ///
    /// Payloads that fail to decode are skipped.
    pub fn published_events<E: BusEvent>(&self) -> Vec<E> {
        self.published(E::CHANNEL)
            .iter()
            .filter_map(|m| m.decode().ok())
            .collect()
    }

    pub fn clear_journal(&self) {
        lock(&self.inner.journal).clear();
    }

    /// Number of live subscriptions on `channel`
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        lock(&self.inner.subscribers)
            .get(&channel)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn record(&self, message: &BusMessage) {
        let capacity = self.inner.journal_capacity;
        if capacity == 0 {
            return;
        }
        let mut journal = lock(&self.inner.journal);
        while journal.len() >= capacity {
            journal.pop_front();
        }
        journal.push_back(message.clone());
    }

    fn take_injected_failure(&self, channel: Channel) -> bool {
        let mut pending = lock(&self.inner.pending_failures);
        match pending.get_mut(&channel) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, channel: Channel, payload: String) -> Result<(), BusError> {
        if !self.is_reachable() {
            return Err(BusError::Unreachable("in-memory bus is offline".to_string()));
        }
        if self.take_injected_failure(channel) {
            return Err(BusError::Rejected {
                channel,
                reason: "injected failure".to_string(),
            });
        }

        let message = BusMessage::new(channel, payload);
        self.record(&message);

        let mut subscribers = lock(&self.inner.subscribers);
        if let Some(subs) = subscribers.get_mut(&channel) {
            subs.retain(|tx| tx.send(message.clone()).is_ok());
            debug!(channel = %channel, receivers = subs.len(), "Published message");
        }
        Ok(())
    }

    async fn subscribe(&self, channel: Channel) -> Result<Subscription, BusError> {
        if !self.is_reachable() {
            warn!(channel = %channel, "Subscribe attempted while bus is offline");
            return Err(BusError::Unreachable("in-memory bus is offline".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.inner.subscribers)
            .entry(channel)
            .or_default()
            .push(tx);
        Ok(Subscription::new(channel, rx))
    }

    async fn ping(&self) -> Result<(), BusError> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(BusError::Unreachable("in-memory bus is offline".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_to_every_subscriber() {
        let bus = InMemoryBus::new();
        let mut a = bus.subscribe(Channel::SensorReading).await.unwrap();
        let mut b = bus.subscribe(Channel::SensorReading).await.unwrap();
        let mut other = bus.subscribe(Channel::SensorStatus).await.unwrap();

        bus.publish(Channel::SensorReading, "{}".to_string())
            .await
            .unwrap();

        assert_eq!(a.recv().await.unwrap().payload, "{}");
        assert_eq!(b.recv().await.unwrap().payload, "{}");
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscriptions_are_pruned() {
        let bus = InMemoryBus::new();
        let sub = bus.subscribe(Channel::SensorStatus).await.unwrap();
        assert_eq!(bus.subscriber_count(Channel::SensorStatus), 1);

        drop(sub);
        bus.publish(Channel::SensorStatus, "{}".to_string())
            .await
            .unwrap();
        assert_eq!(bus.subscriber_count(Channel::SensorStatus), 0);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed_in_order() {
        let bus = InMemoryBus::new();
        bus.fail_next(Channel::SensorReading, 2);

        assert!(bus.publish(Channel::SensorReading, "1".into()).await.is_err());
        assert!(bus.publish(Channel::SensorReading, "2".into()).await.is_err());
        assert!(bus.publish(Channel::SensorReading, "3".into()).await.is_ok());

        // Other channels are unaffected
        bus.fail_next(Channel::SensorReading, 1);
        assert!(bus.publish(Channel::SensorStatus, "s".into()).await.is_ok());

        let journal = bus.published(Channel::SensorReading);
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].payload, "3");
    }

    #[tokio::test]
    async fn test_journal_keeps_only_the_newest_entries() {
        let bus = InMemoryBus::with_journal_capacity(3);
        for i in 1..=5 {
            bus.publish(Channel::SensorReading, i.to_string())
                .await
                .unwrap();
        }

        let payloads: Vec<String> = bus
            .published(Channel::SensorReading)
            .into_iter()
            .map(|m| m.payload)
            .collect();
        assert_eq!(payloads, vec!["3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_journal_but_still_delivers() {
        let bus = InMemoryBus::with_journal_capacity(0);
        let mut sub = bus.subscribe(Channel::SensorReading).await.unwrap();
        for _ in 0..100 {
            bus.publish(Channel::SensorReading, "{}".to_string())
                .await
                .unwrap();
        }

        assert!(bus.published(Channel::SensorReading).is_empty());
        assert_eq!(sub.recv().await.unwrap().payload, "{}");
    }

    #[tokio::test]
    async fn test_unreachable_bus_rejects_everything() {
        let bus = InMemoryBus::new();
        bus.set_reachable(false);

        assert!(bus.ping().await.is_err());
        assert!(matches!(
            bus.publish(Channel::SensorStatus, "{}".into()).await,
            Err(BusError::Unreachable(_))
        ));
        assert!(bus.subscribe(Channel::SensorCreated).await.is_err());

        bus.set_reachable(true);
        assert!(bus.ping().await.is_ok());
    }
}
