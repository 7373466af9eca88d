//! Per-connection outbound send queue.
//!
//! Producers are the owning connection task plus any task broadcasting
//! into the world; the single consumer is the connection's writer
//! task. The queue is bounded: overflow applies the configured policy
//! instead of growing without limit.

use std::collections::VecDeque;
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// What to do when a slow client's queue fills up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Evict the oldest non-critical packet; disconnect if every
    /// queued packet is critical.
    #[default]
    Drop,
    /// Disconnect the client outright.
    Disconnect,
}

/// An encoded packet waiting to be written to the socket.
#[derive(Clone, Debug)]
pub struct QueuedPacket {
    /// Critical packets (spawns, level data, disconnects) are never
    /// dropped by the overflow policy.
    pub critical: bool,
    pub bytes: Bytes,
}

impl QueuedPacket {
    pub fn critical(bytes: Bytes) -> Self {
        Self {
            critical: true,
            bytes,
        }
    }

    pub fn droppable(bytes: Bytes) -> Self {
        Self {
            critical: false,
            bytes,
        }
    }
}

struct QueueInner {
    queue: VecDeque<QueuedPacket>,
    closed: Option<String>,
}

/// Outcome of waiting on the queue.
pub enum Drained {
    Batch(Vec<QueuedPacket>),
    /// Queue closed and empty; the reason that closed it.
    Closed(String),
}

pub struct SendQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl SendQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                queue: VecDeque::new(),
                closed: None,
            }),
            notify: Notify::new(),
            capacity,
            policy,
        }
    }

    /// Append a packet, applying the overflow policy if the queue is
    /// full. Pushes to a closed queue are silently discarded.
    pub fn push(&self, packet: QueuedPacket) {
        let mut inner = self.inner.lock().expect("send queue poisoned");
        if inner.closed.is_some() {
            return;
        }
        if inner.queue.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::Drop => {
                    match inner.queue.iter().position(|p| !p.critical) {
                        Some(idx) => {
                            inner.queue.remove(idx);
                            debug!("send queue full, dropped oldest non-critical packet");
                        }
                        None => {
                            warn!("send queue full of critical packets, disconnecting");
                            inner.closed = Some("send queue overflow".to_string());
                            inner.queue.clear();
                            drop(inner);
                            self.notify.notify_one();
                            return;
                        }
                    }
                }
                OverflowPolicy::Disconnect => {
                    warn!("send queue overflow, disconnecting slow client");
                    inner.closed = Some("send queue overflow".to_string());
                    inner.queue.clear();
                    drop(inner);
                    self.notify.notify_one();
                    return;
                }
            }
        }
        inner.queue.push_back(packet);
        drop(inner);
        self.notify.notify_one();
    }

    /// Close the queue. Already-queued packets are still delivered
    /// before the writer observes `Closed`.
    pub fn close(&self, reason: &str) {
        let mut inner = self.inner.lock().expect("send queue poisoned");
        if inner.closed.is_none() {
            inner.closed = Some(reason.to_string());
        }
        drop(inner);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().expect("send queue poisoned").closed.is_some()
    }

    /// Wait for queued packets or closure. Single consumer.
    pub async fn drain(&self) -> Drained {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock().expect("send queue poisoned");
                if !inner.queue.is_empty() {
                    return Drained::Batch(inner.queue.drain(..).collect());
                }
                if let Some(reason) = &inner.closed {
                    return Drained::Closed(reason.clone());
                }
            }
            notified.await;
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(critical: bool, marker: u8) -> QueuedPacket {
        QueuedPacket {
            critical,
            bytes: Bytes::copy_from_slice(&[marker]),
        }
    }

    #[tokio::test]
    async fn drains_in_fifo_order() {
        let queue = SendQueue::new(8, OverflowPolicy::Drop);
        queue.push(packet(false, 1));
        queue.push(packet(true, 2));
        match queue.drain().await {
            Drained::Batch(batch) => {
                assert_eq!(batch.len(), 2);
                assert_eq!(batch[0].bytes[0], 1);
                assert_eq!(batch[1].bytes[0], 2);
            }
            Drained::Closed(_) => panic!("queue should not be closed"),
        }
    }

    #[test]
    fn drop_policy_evicts_oldest_non_critical() {
        let queue = SendQueue::new(3, OverflowPolicy::Drop);
        queue.push(packet(true, 1));
        queue.push(packet(false, 2));
        queue.push(packet(false, 3));
        queue.push(packet(false, 4)); // evicts marker 2
        assert_eq!(queue.len(), 3);
        assert!(!queue.is_closed());
    }

    #[test]
    fn drop_policy_disconnects_when_all_critical() {
        let queue = SendQueue::new(2, OverflowPolicy::Drop);
        queue.push(packet(true, 1));
        queue.push(packet(true, 2));
        queue.push(packet(true, 3));
        assert!(queue.is_closed());
    }

    #[test]
    fn disconnect_policy_closes_on_overflow() {
        let queue = SendQueue::new(1, OverflowPolicy::Disconnect);
        queue.push(packet(false, 1));
        queue.push(packet(false, 2));
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn close_delivers_pending_then_reason() {
        let queue = SendQueue::new(8, OverflowPolicy::Drop);
        queue.push(packet(true, 1));
        queue.close("shutdown");
        match queue.drain().await {
            Drained::Batch(batch) => assert_eq!(batch.len(), 1),
            Drained::Closed(_) => panic!("pending packets should drain first"),
        }
        match queue.drain().await {
            Drained::Closed(reason) => assert_eq!(reason, "shutdown"),
            Drained::Batch(_) => panic!("queue should be closed"),
        }
    }

    #[test]
    fn push_after_close_is_discarded() {
        let queue = SendQueue::new(8, OverflowPolicy::Drop);
        queue.close("done");
        queue.push(packet(true, 1));
        assert_eq!(queue.len(), 0);
    }
}
