//! In-memory transport with artificial delivery delay
//!
//! A [`LaggedChannel`] emulates one direction of a network link. `send`
//! stamps each message with a due time and appends it; `receive` hands out
//! the message at the head of the queue once its due time has passed.
//!
//! Messages are delivered in send order as long as the delay used on a
//! channel never decreases. When a later message carries a shorter delay, it
//! stays behind any earlier message that is not yet due and is only handed
//! out by a later `receive` call, after the earlier one has been taken. The
//! channel may therefore reorder against true due-time order, but a message
//! is never delivered before its own due time.
//!
//! The queue is behind a mutex so the two ends may live on different tasks.

use crate::{Clock, Timestamp};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A message waiting in a channel
#[derive(Debug, Clone)]
pub struct QueuedMessage<T> {
    /// Earliest time the message may be received
    pub due_at: Timestamp,
    /// The message itself
    pub payload: T,
}

/// One direction of a lagged link
///
/// Cloning yields another handle to the same queue; the producer and the
/// consumer each hold one.
pub struct LaggedChannel<T, C: Clock> {
    queue: Arc<Mutex<VecDeque<QueuedMessage<T>>>>,
    clock: C,
}

impl<T, C: Clock> LaggedChannel<T, C> {
    /// Create an empty channel reading time from `clock`
    pub fn new(clock: C) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            clock,
        }
    }

    /// Enqueue `payload` for delivery `delay` from now
    pub fn send(&self, delay: Duration, payload: T) {
        let due_at = self.clock.now() + delay;
        self.lock().push_back(QueuedMessage { due_at, payload });
    }

    /// Take the head message if it is due
    ///
    /// Returns `None` when the queue is empty or its head is still in flight,
    /// even if a message further back is already due.
    pub fn receive(&self) -> Option<T> {
        let now = self.clock.now();
        let mut queue = self.lock();
        match queue.front() {
            Some(head) if head.due_at <= now => queue.pop_front().map(|m| m.payload),
            _ => None,
        }
    }

    /// Due time of the head message
    pub fn next_due(&self) -> Option<Timestamp> {
        self.lock().front().map(|m| m.due_at)
    }

    /// Take every message [`receive`](Self::receive) would currently yield, in order
    pub fn drain_ready(&self) -> Vec<T> {
        std::iter::from_fn(|| self.receive()).collect()
    }

    /// Number of queued messages, due or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The clock this channel stamps messages with
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedMessage<T>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, C: Clock> Clone for LaggedChannel<T, C> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            clock: self.clock.clone(),
        }
    }
}

impl<T, C: Clock> fmt::Debug for LaggedChannel<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaggedChannel")
            .field("queued", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_not_delivered_before_due() {
        let clock = ManualClock::new();
        let channel = LaggedChannel::new(clock.clone());

        channel.send(ms(100), "a");
        clock.advance_millis(99);
        assert_eq!(channel.receive(), None);

        clock.advance_millis(1);
        assert_eq!(channel.receive(), Some("a"));
        assert!(channel.is_empty());
    }

    #[test]
    fn test_zero_delay_is_immediately_ready() {
        let clock = ManualClock::new();
        let channel = LaggedChannel::new(clock);
        channel.send(Duration::ZERO, 1);
        assert_eq!(channel.receive(), Some(1));
    }

    #[test]
    fn test_fifo_with_constant_delay() {
        let clock = ManualClock::new();
        let channel = LaggedChannel::new(clock.clone());

        for i in 0..5 {
            channel.send(ms(250), i);
            clock.advance_millis(10);
        }
        clock.advance_millis(1000);

        assert_eq!(channel.drain_ready(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_shorter_delay_waits_behind_earlier_message() {
        let clock = ManualClock::new();
        let channel = LaggedChannel::new(clock.clone());

        channel.send(ms(100), "A");
        channel.send(ms(10), "B");

        clock.set(Timestamp::from_millis(50));
        assert_eq!(channel.receive(), None);
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.next_due(), Some(Timestamp::from_millis(100)));

        clock.set(Timestamp::from_millis(150));
        assert_eq!(channel.receive(), Some("A"));
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.receive(), Some("B"));
        assert_eq!(channel.receive(), None);
    }

    #[test]
    fn test_clones_share_queue() {
        let clock = ManualClock::new();
        let producer = LaggedChannel::new(clock.clone());
        let consumer = producer.clone();

        producer.send(ms(5), 42u32);
        assert_eq!(consumer.len(), 1);
        clock.advance_millis(5);
        assert_eq!(consumer.receive(), Some(42));
        assert!(producer.is_empty());
    }
}
