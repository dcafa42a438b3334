//! In-process fan-out of [`Event`]s to live monitors.
//!
//! ```text
//! Publishers (many):                    Subscriptions (many):
//!   submit_exam ──┐                   ┌──► queue ──► monitor stream 1
//!   signal ───────┼──► Broadcaster ───┼──► queue ──► monitor stream 2
//!   ...  ─────────┘   (registry lock)  └──► queue ──► monitor stream N
//! ```
//!
//! - `publish()` never blocks: every subscription owns an unbounded queue and
//!   delivery is a non-blocking send performed under the registry lock.
//! - A subscription only sees events published after it was created.
//! - Dropping a [`Subscription`] removes it from the registry, whatever the
//!   reason the consumer stopped (disconnect, task abort, error).

use futures_util::Stream;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use crate::{error::Error, event::Event};

type Registry = Arc<Mutex<HashMap<Uuid, UnboundedSender<Event>>>>;

/// Shared handle to the set of live subscriptions. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Broadcaster(Registry);

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `event` for every registered subscription.
    ///
    /// A delivery that cannot be enqueued is dropped for that subscription
    /// only; the publisher never sees an error.
    pub fn publish(&self, event: Event) {
        let subscribers = self.0.lock();

        for (id, tx) in subscribers.iter() {
            if tx.send(event.clone()).is_err() {
                debug!("{}", Error::SubscriptionDropped(*id));
            }
        }
    }

    /// Registers a new subscription that receives every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = unbounded_channel();
        let id = Uuid::new_v4();

        let total = {
            let mut subscribers = self.0.lock();
            subscribers.insert(id, tx);
            subscribers.len()
        };

        debug!("subscription {id} registered, {total} live");

        Subscription {
            id,
            rx,
            registry: self.0.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.lock().len()
    }
}

/// Infinite, FIFO stream of events bound to one consumer.
///
/// The stream never completes on its own; it ends when the value is dropped,
/// which also deregisters it from the [`Broadcaster`].
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    rx: UnboundedReceiver<Event>,
    registry: Registry,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next event.
    pub async fn recv(&mut self) -> Event {
        match self.rx.recv().await {
            Some(event) => event,
            // the sender lives in the registry until this value is dropped
            None => std::future::pending().await,
        }
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(event)),
            // the sender lives in the registry until this value is dropped
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let total = {
            let mut subscribers = self.registry.lock();
            subscribers.remove(&self.id);
            subscribers.len()
        };

        debug!("subscription {} released, {total} live", self.id);
    }
}
