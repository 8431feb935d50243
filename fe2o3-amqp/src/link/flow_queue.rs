//! Component A: the prefetch buffer and its size-based credit math.

use std::collections::VecDeque;

use super::{delivery::Delivery, DEFAULT_AVG_MSG_SIZE, MAX_CREDIT_PER_FLOW};

/// An entry buffered in the [`FlowQueue`], paired with the serialized byte size the
/// assembler measured for it.
#[derive(Debug)]
struct Entry {
    delivery: Delivery,
    size: u64,
}

/// Buffers prefetched messages and derives the credit to advertise to the peer.
///
/// In count mode (`total_cache_bytes` unset) the queue is a plain FIFO buffer and never
/// changes link credit on its own — auto-credit or on-demand credit (handled by
/// [`crate::link::receiver`]) governs flow instead. In size mode, enqueue/dequeue drive
/// [`Self::bounded_credit`] through the hysteresis watermarks described in the module's
/// governing design: credit rises only once occupancy drains below 50% of the budget and
/// falls as soon as it crosses 90%.
#[derive(Debug)]
pub struct FlowQueue {
    entries: VecDeque<Entry>,
    total_cache_bytes: Option<u64>,
    cache_size_credit: i64,
    avg_msg_size: u64,
    bounded_credit: u32,
    max_credit_per_flow: u32,
}

impl FlowQueue {
    /// Creates an empty queue. `total_cache_bytes` selects size mode when set.
    pub fn new(total_cache_bytes: Option<u64>) -> Self {
        Self::with_max_credit_per_flow(total_cache_bytes, MAX_CREDIT_PER_FLOW)
    }

    /// Creates an empty queue with a non-default ceiling on the credit a single flow
    /// update may request (see [`crate::link::builder::ReceiverEngineBuilder::max_credit_per_flow`]).
    pub fn with_max_credit_per_flow(total_cache_bytes: Option<u64>, max_credit_per_flow: u32) -> Self {
        let cache_size_credit = total_cache_bytes.unwrap_or(0) as i64;
        Self {
            entries: VecDeque::new(),
            total_cache_bytes,
            cache_size_credit,
            avg_msg_size: DEFAULT_AVG_MSG_SIZE,
            bounded_credit: 0,
            max_credit_per_flow,
        }
    }

    /// Whether this queue is operating in size-based (prefetch) mode.
    pub fn is_size_mode(&self) -> bool {
        self.total_cache_bytes.is_some()
    }

    /// Number of messages currently buffered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue has no buffered messages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn low_watermark(&self) -> i64 {
        (self.total_cache_bytes.unwrap_or(0) as f64 * 0.5) as i64
    }

    fn high_overflow_buffer(&self) -> i64 {
        (self.total_cache_bytes.unwrap_or(0) as f64 * 0.1) as i64
    }

    /// The currently advertised credit derived from the byte budget. Zero outside size mode.
    pub fn bounded_credit(&self) -> u32 {
        self.bounded_credit
    }

    /// Appends a freshly assembled message to the tail of the queue.
    ///
    /// Returns `true` if the derived credit changed and the caller should push a new total
    /// link credit to the peer.
    pub fn enqueue(&mut self, delivery: Delivery, size: u64) -> bool {
        self.entries.push_back(Entry { delivery, size });

        if !self.is_size_mode() {
            return false;
        }

        self.cache_size_credit -= size as i64;

        let before = self.bounded_credit;
        if self.cache_size_credit > self.high_overflow_buffer() {
            self.update_credit(None);
        } else if self.cache_size_credit <= 0 {
            self.bounded_credit = 0;
        } else {
            self.bounded_credit = 1;
        }
        before != self.bounded_credit
    }

    /// Removes and returns the oldest buffered message, if any.
    ///
    /// Returns the message (if any) and whether the derived credit changed.
    pub fn dequeue(&mut self) -> (Option<Delivery>, bool) {
        let entry = match self.entries.pop_front() {
            Some(entry) => entry,
            None => return (None, false),
        };

        if !self.is_size_mode() {
            return (Some(entry.delivery), false);
        }

        self.cache_size_credit += entry.size as i64;

        let before = self.bounded_credit;
        if self.cache_size_credit >= self.low_watermark() {
            self.update_credit(None);
        } else if self.cache_size_credit > 0 {
            self.bounded_credit = 1;
        }
        (Some(entry.delivery), before != self.bounded_credit)
    }

    /// Recomputes `avg_msg_size` and `bounded_credit` from the current occupancy.
    ///
    /// `extra_msg_size` accounts for a message that was handed straight to a waiter
    /// without passing through the queue, so the running average still reflects it.
    ///
    /// Returns whether `bounded_credit` changed.
    pub fn update_credit(&mut self, extra_msg_size: Option<u64>) -> bool {
        if !self.is_size_mode() {
            return false;
        }
        let total = self.total_cache_bytes.unwrap_or(0);

        let mut count = self.entries.len() as u64;
        let mut occupied = total as i64 - self.cache_size_credit;
        if let Some(size) = extra_msg_size {
            count += 1;
            occupied += size as i64;
        }
        if count > 0 && occupied > 0 {
            self.avg_msg_size = occupied as u64 / count;
            if self.avg_msg_size == 0 {
                self.avg_msg_size = 1;
            }
        }

        let before = self.bounded_credit;
        self.bounded_credit = if self.cache_size_credit <= 0 {
            0
        } else {
            let quotient = self.cache_size_credit as u64 / self.avg_msg_size;
            let corrected = if quotient == 0 { 1 } else { quotient };
            corrected.min(self.max_credit_per_flow as u64) as u32
        };
        before != self.bounded_credit
    }

    /// Changes the byte budget (e.g. in response to a settings update), switching modes if
    /// `total_cache_bytes` toggles between `Some`/`None`.
    ///
    /// Returns whether `bounded_credit` changed.
    pub fn set_budget(&mut self, total_cache_bytes: Option<u64>) -> bool {
        let occupied: u64 = self.entries.iter().map(|e| e.size).sum();
        self.total_cache_bytes = total_cache_bytes;
        self.cache_size_credit = total_cache_bytes.unwrap_or(0) as i64 - occupied as i64;
        self.update_credit(None)
    }
}
