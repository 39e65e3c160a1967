// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Named FIFO queues shared between the controller, workers and reply handlers.
//!
//! Every queue is a multi-producer multi-consumer `crossbeam_channel`, bounded when
//! the pipeline sets `queue_capacity`. All queues of a registry share one in-flight
//! counter: a successful put adds one, and the consumer subtracts one once it has
//! completely handled the item (including enqueuing whatever the item produced).
//! `Pipeline::running` reads that counter so an item that has been dequeued but not
//! yet turned into downstream work still counts as activity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvError, SendTimeoutError, Sender, TrySendError};

use crate::config::consts::REPLY_QUEUE_NAME;
use crate::errors::QueueError;
use crate::message::{Envelope, Reply};

/// A named FIFO queue. Clones share the same underlying channel.
pub struct Queue<T> {
    name: Arc<str>,
    sender: Sender<T>,
    receiver: Receiver<T>,
    in_flight: Arc<AtomicUsize>,
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> Queue<T> {
    fn new(name: &str, capacity: Option<usize>, in_flight: Arc<AtomicUsize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity.max(1)),
            None => crossbeam_channel::unbounded(),
        };
        Self {
            name: Arc::from(name),
            sender,
            receiver,
            in_flight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue without blocking.
    pub fn put(&self, item: T) -> Result<(), QueueError> {
        // count first so a fast consumer can never settle an item we have not counted
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.sender.try_send(item) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.settle();
                Err(match error {
                    TrySendError::Full(_) => QueueError::Full {
                        queue: self.name.to_string(),
                    },
                    TrySendError::Disconnected(_) => QueueError::Disconnected {
                        queue: self.name.to_string(),
                    },
                })
            }
        }
    }

    /// Enqueue, waiting up to `timeout` for room in a bounded queue.
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), QueueError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.sender.send_timeout(item, timeout) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.settle();
                Err(match error {
                    SendTimeoutError::Timeout(_) => QueueError::Timeout {
                        queue: self.name.to_string(),
                        timeout,
                    },
                    SendTimeoutError::Disconnected(_) => QueueError::Disconnected {
                        queue: self.name.to_string(),
                    },
                })
            }
        }
    }

    /// Block until an item arrives. The item counts as handled once returned.
    pub fn get(&self) -> Result<T, QueueError> {
        let item = self.take()?;
        self.settle();
        Ok(item)
    }

    /// Take an item if one is waiting. The item counts as handled once returned.
    pub fn try_get(&self) -> Option<T> {
        let item = self.receiver.try_recv().ok()?;
        self.settle();
        Some(item)
    }

    /// Wait up to `timeout` for an item. The item counts as handled once returned.
    pub fn get_timeout(&self, timeout: Duration) -> Option<T> {
        let item = self.receiver.recv_timeout(timeout).ok()?;
        self.settle();
        Some(item)
    }

    /// Block until an item arrives; the caller must [`settle`](Self::settle) it.
    pub(crate) fn take(&self) -> Result<T, QueueError> {
        self.receiver.recv().map_err(|RecvError| QueueError::Disconnected {
            queue: self.name.to_string(),
        })
    }

    /// Mark one taken item as completely handled.
    pub(crate) fn settle(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// `None` for unbounded queues.
    pub fn capacity(&self) -> Option<usize> {
        self.sender.capacity()
    }
}

/// Owns one input queue per node plus the shared reply queue.
///
/// Node queues are created on first access; concurrent first access for the same
/// name always yields the same queue.
pub struct QueueRegistry {
    queues: RwLock<HashMap<String, Queue<Envelope>>>,
    reply: Queue<Reply>,
    capacity: Option<usize>,
    in_flight: Arc<AtomicUsize>,
}

impl QueueRegistry {
    pub fn new(capacity: Option<usize>) -> Self {
        let in_flight = Arc::new(AtomicUsize::new(0));
        Self {
            queues: RwLock::new(HashMap::new()),
            reply: Queue::new(REPLY_QUEUE_NAME, capacity, Arc::clone(&in_flight)),
            capacity,
            in_flight,
        }
    }

    /// The queue for `name`, created if this is the first request for it.
    pub fn get_queue(&self, name: &str) -> Queue<Envelope> {
        if let Some(queue) = self
            .queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return queue.clone();
        }

        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(name.to_string())
            .or_insert_with(|| Queue::new(name, self.capacity, Arc::clone(&self.in_flight)))
            .clone()
    }

    pub fn reply_queue(&self) -> Queue<Reply> {
        self.reply.clone()
    }

    /// True when every queue, the reply queue included, holds no items.
    pub fn all_empty(&self) -> bool {
        self.reply.is_empty()
            && self
                .queues
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .all(|queue| queue.is_empty())
    }

    /// Items enqueued but not yet completely handled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Current depth of every queue, node queues sorted by name, reply queue last.
    pub fn depths(&self) -> Vec<(String, usize)> {
        let mut depths: Vec<(String, usize)> = self
            .queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, queue)| (name.clone(), queue.len()))
            .collect();
        depths.sort();
        depths.push((REPLY_QUEUE_NAME.to_string(), self.reply.len()));
        depths
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("depths", &self.depths())
            .field("in_flight", &self.in_flight())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{create_new_message, Signal};
    use serde_json::json;
    use std::thread;

    #[test]
    fn test_get_queue_returns_same_queue() {
        let registry = QueueRegistry::new(None);
        let first = registry.get_queue("a");
        let second = registry.get_queue("a");

        first.put(Envelope::Signal(Signal::Emit)).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.try_get(), Some(Envelope::Signal(Signal::Emit)));
    }

    #[test]
    fn test_concurrent_first_access_creates_one_queue() {
        let registry = Arc::new(QueueRegistry::new(None));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry
                        .get_queue("shared")
                        .put(Envelope::Signal(Signal::Reset))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.get_queue("shared").len(), 8);
        assert_eq!(registry.depths().len(), 2);
    }

    #[test]
    fn test_all_empty_includes_reply_queue() {
        let registry = QueueRegistry::new(None);
        registry.get_queue("a");
        assert!(registry.all_empty());

        registry
            .reply_queue()
            .put(Reply::Signal(Signal::Terminate))
            .unwrap();
        assert!(!registry.all_empty());

        registry.reply_queue().try_get();
        assert!(registry.all_empty());
    }

    #[test]
    fn test_in_flight_tracks_put_and_settle() {
        let registry = QueueRegistry::new(None);
        let queue = registry.get_queue("a");
        queue
            .put(Envelope::Data(create_new_message(json!(1), 0.0)))
            .unwrap();
        assert_eq!(registry.in_flight(), 1);

        let taken = queue.take().unwrap();
        assert!(matches!(taken, Envelope::Data(_)));
        assert!(registry.all_empty());
        assert_eq!(registry.in_flight(), 1);

        queue.settle();
        assert_eq!(registry.in_flight(), 0);
        queue.settle();
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_bounded_queue_reports_full() {
        let registry = QueueRegistry::new(Some(1));
        let queue = registry.get_queue("tight");
        assert_eq!(queue.capacity(), Some(1));

        queue.put(Envelope::Signal(Signal::Emit)).unwrap();
        let error = queue.put(Envelope::Signal(Signal::Emit)).unwrap_err();
        assert_eq!(
            error,
            QueueError::Full {
                queue: "tight".to_string()
            }
        );
        assert_eq!(registry.in_flight(), 1);

        let error = queue
            .put_timeout(Envelope::Signal(Signal::Emit), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(error, QueueError::Timeout { .. }));
        assert_eq!(registry.in_flight(), 1);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let registry = QueueRegistry::new(Some(0));
        let queue = registry.get_queue("z");
        assert!(queue.put(Envelope::Signal(Signal::Emit)).is_ok());
    }

    #[test]
    fn test_fifo_within_a_queue() {
        let registry = QueueRegistry::new(None);
        let queue = registry.get_queue("fifo");
        for i in 0..5 {
            queue
                .put(Envelope::Data(create_new_message(json!(i), 0.0)))
                .unwrap();
        }
        for i in 0..5 {
            match queue.get().unwrap() {
                Envelope::Data(message) => assert_eq!(message.payload, json!(i)),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(registry.in_flight(), 0);
    }
}
