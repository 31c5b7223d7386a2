use std::{
    collections::BTreeSet,
    sync::{
        Arc, PoisonError, RwLock, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use once_cell::sync::OnceCell;

use crate::interpreter::{
    evaluator::core::EvalResult,
    process::mailbox::Mailbox,
    value::{collection::MapValue, core::Value},
};

static BROKER: OnceCell<Broker> = OnceCell::new();

/// A consumer with a topic set and a private mailbox.
#[derive(Debug)]
pub struct Subscriber {
    id:      u64,
    topics:  RwLock<BTreeSet<String>>,
    mailbox: Mailbox,
    active:  AtomicBool,
}

impl Subscriber {
    fn new(id: u64, topic: &str) -> Self {
        Self { id,
               topics: RwLock::new(BTreeSet::from([topic.to_string()])),
               mailbox: Mailbox::new(),
               active: AtomicBool::new(true) }
    }

    /// Subscriber id, unique for the lifetime of the broker.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` until the subscriber is closed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The subscribed topics, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Returns `true` if the subscriber listens on `topic`.
    #[must_use]
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.read().unwrap_or_else(PoisonError::into_inner).contains(topic)
    }

    /// Starts listening on `topic` as well.
    pub fn add_topic(&self, topic: &str) {
        self.topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.to_string());
    }

    /// Stops listening on `topic`; returns `true` if it was subscribed.
    pub fn remove_topic(&self, topic: &str) -> bool {
        self.topics.write().unwrap_or_else(PoisonError::into_inner).remove(topic)
    }

    /// Blocks until a message arrives and returns it as `{topic, msg}`.
    ///
    /// # Errors
    /// Returns a `ProcessError` once the subscriber is closed and drained,
    /// or when the timeout expires.
    pub fn poll(&self, timeout: Option<Duration>) -> EvalResult<Value> {
        self.mailbox.recv(timeout)
    }

    /// Marks the subscriber inactive and closes its mailbox.
    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
        self.mailbox.close();
    }

    fn deliver(&self, topic: &str, body: &Value) -> EvalResult<bool> {
        if !self.is_active() || !self.has_topic(topic) {
            return Ok(false);
        }
        let message = MapValue::from_pairs([(Value::from("topic"), Value::from(topic)),
                                            (Value::from("msg"), body.clone())])?;
        Ok(self.mailbox.send(Value::from(message)).is_ok())
    }
}

/// Routes published messages to the subscribers of their topic.
///
/// The broker only holds weak references: a subscriber whose last handle is
/// dropped stops receiving and is pruned on the next publish.
#[derive(Debug, Default)]
pub struct Broker {
    subscribers: RwLock<Vec<Weak<Subscriber>>>,
    next_id:     AtomicU64,
}

impl Broker {
    /// The process-wide broker.
    pub fn global() -> &'static Self {
        BROKER.get_or_init(Self::default)
    }

    /// Allocates an active subscriber listening on `topic`.
    pub fn subscribe(&self, topic: &str) -> Arc<Subscriber> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let subscriber = Arc::new(Subscriber::new(id, topic));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&subscriber));
        tracing::debug!(subscriber = id, topic, "subscribe");
        subscriber
    }

    /// Delivers `{topic, msg: body}` to every active subscriber of `topic`
    /// and returns how many received it.
    ///
    /// # Errors
    /// Never fails for string topics; the message map is built from string
    /// keys only.
    pub fn publish(&self, topic: &str, body: &Value) -> EvalResult<usize> {
        let mut delivered = 0;
        let mut dropped = false;
        for subscriber in self.subscribers.read().unwrap_or_else(PoisonError::into_inner).iter() {
            match subscriber.upgrade() {
                Some(subscriber) if subscriber.deliver(topic, body)? => delivered += 1,
                Some(_) => {},
                None => dropped = true,
            }
        }
        if dropped {
            self.prune();
        }
        tracing::debug!(topic, delivered, "publish");
        Ok(delivered)
    }

    fn prune(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|s| s.strong_count() > 0);
    }

    /// Closes `subscriber` and drops it from the routing list.
    pub fn unsubscribe(&self, subscriber: &Subscriber) {
        subscriber.close();
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|s| s.upgrade().is_some_and(|s| s.id() != subscriber.id()));
        tracing::debug!(subscriber = subscriber.id(), "unsubscribe");
    }

    /// Number of registered subscribers that still have a live handle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every subscriber and restarts id allocation.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut *self.subscribers
                                               .write()
                                               .unwrap_or_else(PoisonError::into_inner));
        for subscriber in drained.iter().filter_map(Weak::upgrade) {
            subscriber.close();
        }
        self.next_id.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_only_to_matching_topics() {
        let broker = Broker::default();
        let news = broker.subscribe("news");
        let sport = broker.subscribe("sport");
        assert_eq!(broker.publish("news", &Value::Integer(1)).unwrap(), 1);
        assert!(news.mailbox.try_recv().is_some());
        assert!(sport.mailbox.try_recv().is_none());
    }

    #[test]
    fn closed_subscribers_are_skipped() {
        let broker = Broker::default();
        let s = broker.subscribe("t");
        s.close();
        assert_eq!(broker.publish("t", &Value::Null).unwrap(), 0);
    }

    #[test]
    fn dropped_handles_stop_receiving() {
        let broker = Broker::default();
        let kept = broker.subscribe("t");
        drop(broker.subscribe("t"));
        assert_eq!(broker.len(), 1);
        assert_eq!(broker.publish("t", &Value::Null).unwrap(), 1);
        assert_eq!(broker.subscribers.read().unwrap().len(), 1);
        drop(kept);
        assert_eq!(broker.publish("t", &Value::Null).unwrap(), 0);
        assert!(broker.is_empty());
    }

    #[test]
    fn topics_can_be_added_and_removed() {
        let broker = Broker::default();
        let s = broker.subscribe("a");
        s.add_topic("b");
        assert_eq!(broker.publish("b", &Value::Null).unwrap(), 1);
        assert!(s.remove_topic("a"));
        assert_eq!(broker.publish("a", &Value::Null).unwrap(), 0);
        assert_eq!(s.topics(), vec!["b".to_string()]);
    }
}
