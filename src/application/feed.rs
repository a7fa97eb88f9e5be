use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Products,
    Sellers,
}

/// In-process change notifications for watched collections.
///
/// Publishers never block and never fail: a change published with no
/// subscriber is simply dropped.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Topic>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, topic: Topic) {
        let _ = self.tx.send(topic);
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            topic,
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

/// A cancellable subscription to one topic. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    rx: broadcast::Receiver<Topic>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Wait for the next change to this topic. Returns `false` once the feed
    /// is gone. Falling behind the channel counts as a change, since the
    /// caller re-reads the snapshot anyway.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                Ok(topic) if topic == self.topic => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => return true,
                Err(RecvError::Closed) => return false,
            }
        }
    }

    /// Non-blocking variant of [`Subscription::changed`]: drains pending
    /// notifications and reports whether any concerned this topic.
    pub fn has_changed(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(topic) => changed |= topic == self.topic,
                Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }

    pub fn cancel(self) {}
}

/// Snapshot plus the subscription that reports later changes. The
/// subscription is taken before the snapshot is read, so no change can fall
/// between the two.
#[derive(Debug)]
pub struct Watch<T> {
    pub snapshot: Vec<T>,
    pub subscription: Subscription,
}
