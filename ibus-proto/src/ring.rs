//! Bounded byte queue between the receive interrupt and the main loop.
//!
//! The queue is split into a [`ByteProducer`] (owned by the interrupt side)
//! and a [`ByteConsumer`] (owned by the main loop). The head index is only
//! ever written through the producer and the tail index only through the
//! consumer, so neither side needs a lock and the producer never waits.
//!
//! One slot is kept free to tell "full" from "empty", so a
//! `RingBuffer<64>` holds at most 63 bytes.

use heapless::spsc::{Consumer, Producer, Queue};

/// Receive buffer size used by the firmware.
pub const RX_BUFFER_SIZE: usize = 64;

/// Fixed-capacity single-producer/single-consumer byte queue.
pub struct RingBuffer<const N: usize> {
    queue: Queue<u8, N>,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }

    /// Number of bytes the buffer can hold (`N - 1`).
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Split into the interrupt-side producer and the main-loop consumer.
    ///
    /// The mutable borrow guarantees only one pair of handles exists.
    pub fn split(&mut self) -> (ByteProducer<'_, N>, ByteConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (ByteProducer { inner: producer }, ByteConsumer { inner: consumer })
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write half of a [`RingBuffer`].
pub struct ByteProducer<'a, const N: usize> {
    inner: Producer<'a, u8, N>,
}

impl<const N: usize> ByteProducer<'_, N> {
    /// Append one byte.
    ///
    /// Returns `false` if the buffer is full; the byte is dropped.
    #[inline]
    pub fn push(&mut self, byte: u8) -> bool {
        self.inner.enqueue(byte).is_ok()
    }

    /// Check whether another byte would fit.
    #[inline]
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.inner.ready()
    }
}

/// Read half of a [`RingBuffer`].
pub struct ByteConsumer<'a, const N: usize> {
    inner: Consumer<'a, u8, N>,
}

impl<const N: usize> ByteConsumer<'_, N> {
    /// Take the oldest byte, or `None` if the buffer is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<u8> {
        self.inner.dequeue()
    }

    /// Check whether at least one byte is waiting.
    #[inline]
    #[must_use]
    pub fn available(&self) -> bool {
        self.inner.ready()
    }

    /// Number of bytes currently waiting.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.available()
    }
}

/// Interrupt-side receiver: stores each received byte, dropping on overflow.
///
/// Overflow is lossy by policy. The newest byte is discarded and only
/// counted; nothing is signalled upstream. Framing recovers at the next
/// clean header.
pub struct ByteReceiver<'a, const N: usize> {
    producer: ByteProducer<'a, N>,
    dropped: u32,
}

impl<'a, const N: usize> ByteReceiver<'a, N> {
    /// Wrap the producer half of a ring buffer.
    #[must_use]
    pub fn new(producer: ByteProducer<'a, N>) -> Self {
        Self {
            producer,
            dropped: 0,
        }
    }

    /// Handle one received byte. Never blocks.
    ///
    /// Returns `false` if the byte was dropped because the buffer was full.
    #[inline]
    pub fn on_byte(&mut self, byte: u8) -> bool {
        let stored = self.producer.push(byte);
        if !stored {
            self.dropped = self.dropped.wrapping_add(1);
        }
        stored
    }

    /// Total bytes dropped since creation (wrapping).
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
