use parking_lot::Mutex;
use std::collections::VecDeque;

/// What happens to a record that arrives while the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep what is queued, discard the incoming record.
    #[default]
    DropNewest,
    /// Evict the oldest queued record to make room for the incoming one.
    DropOldest,
}

/// Outcome of [`BoundedQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Stored; carries the queue length after the push.
    Accepted(usize),
    /// Queue was full and one record was discarded per the overflow policy.
    Overflowed(usize),
    /// Queue was closed by shutdown; the record was discarded.
    Closed,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// FIFO with a hard capacity, guarded by a short-held lock.
///
/// Neither side ever waits on the other: producers get an answer
/// immediately and the consumer takes whatever is there.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        BoundedQueue {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            capacity,
            policy,
        }
    }

    pub fn push(&self, item: T) -> Push {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Push::Closed;
        }
        if inner.items.len() < self.capacity {
            inner.items.push_back(item);
            return Push::Accepted(inner.items.len());
        }
        match self.policy {
            OverflowPolicy::DropNewest => {}
            OverflowPolicy::DropOldest => {
                inner.items.pop_front();
                inner.items.push_back(item);
            }
        }
        Push::Overflowed(inner.items.len())
    }

    /// Remove up to `max` items from the front, preserving order.
    pub fn drain(&self, max: usize) -> Vec<T> {
        let mut inner = self.inner.lock();
        let n = max.min(inner.items.len());
        inner.items.drain(..n).collect()
    }

    /// Drop everything still queued and return how many items that was.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let n = inner.items.len();
        inner.items.clear();
        n
    }

    /// Refuse further pushes. Items already queued stay drainable.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
