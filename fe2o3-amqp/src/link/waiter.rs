//! Component B: the FIFO list of pending `begin_receive` calls.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::oneshot, time::Instant};

use super::{delivery::Delivery, error::EngineError};

const PENDING: u8 = 0;
const SIGNALLED: u8 = 1;
const TIMED_OUT: u8 = 2;
const CANCELLED: u8 = 3;

/// Result handed back to a caller of `begin_receive` once its waiter completes.
#[derive(Debug)]
pub struct WaiterResult {
    /// Messages gathered before the waiter completed.
    pub messages: Vec<Delivery>,
    /// Whether the waiter completed because it gathered enough messages / reached the
    /// batch-wait deadline (`true`), as opposed to hitting the overall deadline or being
    /// cancelled with nothing gathered (`false`).
    pub completed_within_time: bool,
}

/// A single pending receive request enrolled in the [`WaiterList`].
///
/// Once `status` transitions away from `Pending` no further message may be appended;
/// the transition is a single atomic compare-and-swap so a message arrival racing a timer
/// firing can never double-complete the waiter.
///
/// `id`/`generation` identify this waiter to its own timer task: `id` is stable for the
/// waiter's lifetime in the list, `generation` bumps every time the armed deadline is
/// replaced (overall timeout -> batch-gather timeout), so a timer task spawned for a
/// superseded generation recognises itself as stale and no-ops instead of completing the
/// waiter early.
#[derive(Debug)]
pub struct Waiter {
    id: u64,
    generation: u64,
    requested_count: usize,
    batch_wait_timeout: Option<Duration>,
    overall_deadline: Instant,
    gathered: Vec<Delivery>,
    status: Arc<AtomicU8>,
    first_gathered_at: Option<Instant>,
    completion: Option<oneshot::Sender<Result<WaiterResult, EngineError>>>,
}

impl Waiter {
    /// Creates a new waiter. `overall_timeout` of `Duration::ZERO` means "expire
    /// immediately if nothing is available right now" — callers that want a minimum wait
    /// should clamp it before constructing the waiter (see
    /// [`crate::link::receiver::ReceiverEngine::begin_receive_remote_messages`]).
    pub fn new(
        requested_count: usize,
        batch_wait_timeout: Option<Duration>,
        overall_timeout: Duration,
    ) -> (Self, oneshot::Receiver<Result<WaiterResult, EngineError>>) {
        let (tx, rx) = oneshot::channel();
        let waiter = Self {
            id: 0,
            generation: 0,
            requested_count: requested_count.max(1),
            batch_wait_timeout,
            overall_deadline: Instant::now() + overall_timeout,
            gathered: Vec::new(),
            status: Arc::new(AtomicU8::new(PENDING)),
            first_gathered_at: None,
            completion: Some(tx),
        };
        (waiter, rx)
    }

    /// The id assigned by the [`WaiterList`] this waiter was enrolled into.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The generation of the currently armed deadline for this waiter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A cheap, clonable handle to this waiter's completion status, usable from a timer
    /// task without holding the coordinator's lock.
    pub fn status_handle(&self) -> Arc<AtomicU8> {
        self.status.clone()
    }

    /// The absolute instant this waiter's overall timeout fires.
    pub fn overall_deadline(&self) -> Instant {
        self.overall_deadline
    }

    /// The instant this waiter's batch-gather timeout fires, if it has started gathering
    /// and a batch timeout is configured.
    pub fn batch_deadline(&self) -> Option<Instant> {
        match (self.first_gathered_at, self.batch_wait_timeout) {
            (Some(at), Some(timeout)) if self.requested_count > 1 => Some(at + timeout),
            _ => None,
        }
    }

    /// Appends a message to this waiter. Returns `true` if the waiter is now satisfied and
    /// should be removed from the list (count reached, or a single-message request got its
    /// one message).
    pub fn gather(&mut self, delivery: Delivery) -> bool {
        if self.first_gathered_at.is_none() {
            self.first_gathered_at = Some(Instant::now());
        }
        self.gathered.push(delivery);
        self.requested_count == 1 || self.gathered.len() >= self.requested_count
    }

    /// Number of messages still wanted.
    pub fn remaining(&self) -> usize {
        self.requested_count.saturating_sub(self.gathered.len())
    }

    /// Requested count for this waiter (used by on-demand credit math).
    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    /// Completes the waiter successfully (count satisfied) and sends the result over its
    /// completion channel. No-op if another path already completed it.
    pub fn complete_signalled(mut self) {
        if self
            .status
            .compare_exchange(PENDING, SIGNALLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let messages = std::mem::take(&mut self.gathered);
            if let Some(tx) = self.completion.take() {
                let _ = tx.send(Ok(WaiterResult {
                    messages,
                    completed_within_time: true,
                }));
            }
        }
    }

    /// Completes the waiter because its *overall* deadline elapsed, handing back whatever
    /// was gathered (possibly nothing). Per §4.B this did not finish within time.
    pub fn complete_timed_out(mut self) {
        if self
            .status
            .compare_exchange(PENDING, TIMED_OUT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let messages = std::mem::take(&mut self.gathered);
            if let Some(tx) = self.completion.take() {
                let _ = tx.send(Ok(WaiterResult {
                    messages,
                    completed_within_time: false,
                }));
            }
        }
    }

    /// Completes the waiter because its *batch-gather* deadline elapsed after the first
    /// message arrived. Per §4.B this still counts as completing within time — the waiter's
    /// overall deadline never fired.
    pub fn complete_batch_gathered(mut self) {
        if self
            .status
            .compare_exchange(PENDING, TIMED_OUT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let messages = std::mem::take(&mut self.gathered);
            if let Some(tx) = self.completion.take() {
                let _ = tx.send(Ok(WaiterResult {
                    messages,
                    completed_within_time: true,
                }));
            }
        }
    }

    /// Completes the waiter with a cancellation error (link abort, explicit cancel), carrying
    /// the link's terminal exception if one was set.
    pub fn complete_cancelled(mut self, cause: Option<EngineError>) {
        if self
            .status
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(tx) = self.completion.take() {
                let _ = tx.send(Err(cause.unwrap_or(EngineError::Cancelled)));
            }
        }
    }
}

/// Outcome of appending a just-arrived message to the first waiter in the list.
#[derive(Debug)]
pub enum Dispatch {
    /// The waiter gathered its last message and was removed; schedule its completion.
    Satisfied(Waiter),
    /// The waiter gathered its first message, is still short of `requested_count`, and has
    /// a batch-gather timeout — its timer must be replaced with one for `deadline` at
    /// `generation`.
    Rearm {
        /// The waiter's stable id.
        id: u64,
        /// The generation the new timer task must present back to still be live.
        generation: u64,
        /// The instant the new timer should fire at.
        deadline: Instant,
    },
    /// The waiter gathered a message but is neither satisfied nor newly due for a rearm.
    Gathered,
}

/// An ordered FIFO list of pending receive requests.
#[derive(Debug, Default)]
pub struct WaiterList {
    waiters: VecDeque<Waiter>,
    next_id: u64,
}

impl WaiterList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Enrolls a new waiter at the tail of the list, returning its assigned id.
    pub fn enrol(&mut self, mut waiter: Waiter) -> u64 {
        self.next_id += 1;
        waiter.id = self.next_id;
        let id = waiter.id;
        self.waiters.push_back(waiter);
        id
    }

    /// Number of waiters currently enrolled.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Whether any waiters are enrolled.
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Sum of `requested_count` across all enrolled waiters.
    pub fn total_requested(&self) -> usize {
        self.waiters.iter().map(Waiter::requested_count).sum()
    }

    /// Whether every enrolled waiter requested exactly one message (the "singleton
    /// regime" from the on-demand credit design).
    pub fn is_singleton_regime(&self) -> bool {
        self.waiters.iter().all(|w| w.requested_count() == 1)
    }

    /// Removes the waiter with the given id, wherever it sits in the list, e.g. when its
    /// timer fires. Returns `None` if no such waiter is enrolled (already dispatched).
    pub fn remove(&mut self, id: u64) -> Option<Waiter> {
        let idx = self.waiters.iter().position(|w| w.id == id)?;
        self.waiters.remove(idx)
    }

    /// The generation currently armed for the waiter with the given id, if still enrolled —
    /// used by a firing timer task to detect it has been superseded by a rearm.
    pub fn generation_of(&self, id: u64) -> Option<u64> {
        self.waiters.iter().find(|w| w.id == id).map(Waiter::generation)
    }

    /// Appends a message to the first waiter in the list.
    pub fn dispatch(&mut self, delivery: Delivery) -> Dispatch {
        let (satisfied, rearm) = {
            let front = match self.waiters.front_mut() {
                Some(front) => front,
                None => return Dispatch::Gathered,
            };
            let was_first = front.first_gathered_at.is_none();
            let satisfied = front.gather(delivery);
            let rearm = if !satisfied && was_first {
                front.batch_deadline().map(|deadline| {
                    front.generation += 1;
                    (front.id, front.generation, deadline)
                })
            } else {
                None
            };
            (satisfied, rearm)
        };
        if satisfied {
            return Dispatch::Satisfied(
                self.waiters
                    .pop_front()
                    .expect("front was just gathered into"),
            );
        }
        if let Some((id, generation, deadline)) = rearm {
            return Dispatch::Rearm {
                id,
                generation,
                deadline,
            };
        }
        Dispatch::Gathered
    }

    /// Removes every waiter and returns them, e.g. for a graceful close or abort.
    pub fn drain_all(&mut self) -> Vec<Waiter> {
        self.waiters.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use fe2o3_amqp_types::messaging::{AmqpValue, Body, Message};
    use serde_amqp::Value;

    fn fake_delivery() -> Delivery {
        let message = Message {
            header: None,
            delivery_annotations: None,
            message_annotations: None,
            properties: None,
            application_properties: None,
            body: Body::Value(AmqpValue(Value::Bool(true))),
            footer: None,
        };
        Delivery::new(0, Bytes::from_static(b"tag").to_vec().into(), message, false)
    }

    #[test]
    fn single_message_waiter_satisfied_on_first_gather() {
        let (mut waiter, _rx) = Waiter::new(1, None, Duration::from_secs(1));
        assert!(waiter.gather(fake_delivery()));
    }

    #[tokio::test]
    async fn dispatch_removes_satisfied_waiter_and_completes_it() {
        let mut list = WaiterList::new();
        let (waiter, rx) = Waiter::new(1, None, Duration::from_secs(1));
        list.enrol(waiter);
        assert_eq!(list.len(), 1);

        let satisfied = match list.dispatch(fake_delivery()) {
            Dispatch::Satisfied(w) => w,
            other => panic!("expected Satisfied, got {other:?}"),
        };
        assert!(list.is_empty());
        satisfied.complete_signalled();

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.messages.len(), 1);
        assert!(result.completed_within_time);
    }

    #[tokio::test]
    async fn multi_message_waiter_stays_enrolled_until_count_reached() {
        let mut list = WaiterList::new();
        let (waiter, rx) = Waiter::new(2, None, Duration::from_secs(1));
        list.enrol(waiter);

        assert!(matches!(list.dispatch(fake_delivery()), Dispatch::Gathered));
        assert_eq!(list.len(), 1);

        let satisfied = match list.dispatch(fake_delivery()) {
            Dispatch::Satisfied(w) => w,
            other => panic!("expected Satisfied, got {other:?}"),
        };
        satisfied.complete_signalled();
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.messages.len(), 2);
    }

    #[test]
    fn dispatch_rearms_batch_timer_on_first_gather_of_multi_waiter() {
        let mut list = WaiterList::new();
        let (waiter, _rx) = Waiter::new(3, Some(Duration::from_millis(200)), Duration::from_secs(10));
        let id = list.enrol(waiter);

        match list.dispatch(fake_delivery()) {
            Dispatch::Rearm {
                id: rearm_id,
                generation,
                ..
            } => {
                assert_eq!(rearm_id, id);
                assert_eq!(generation, 1);
            }
            other => panic!("expected Rearm, got {other:?}"),
        }
        assert_eq!(list.generation_of(id), Some(1));
    }

    #[test]
    fn remove_by_id_takes_waiter_out_of_the_middle_of_the_list() {
        let mut list = WaiterList::new();
        let (w1, _rx1) = Waiter::new(1, None, Duration::from_secs(1));
        let (w2, _rx2) = Waiter::new(1, None, Duration::from_secs(1));
        let (w3, _rx3) = Waiter::new(1, None, Duration::from_secs(1));
        list.enrol(w1);
        let id2 = list.enrol(w2);
        list.enrol(w3);

        let removed = list.remove(id2).expect("waiter should still be enrolled");
        assert_eq!(removed.id(), id2);
        assert_eq!(list.len(), 2);
        assert!(list.remove(id2).is_none());
    }

    #[tokio::test]
    async fn batch_gathered_completion_reports_within_time() {
        let (mut waiter, rx) = Waiter::new(3, Some(Duration::from_millis(200)), Duration::from_secs(10));
        waiter.gather(fake_delivery());
        waiter.complete_batch_gathered();

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.messages.len(), 1);
        assert!(
            result.completed_within_time,
            "a batch-gather timeout is not the overall deadline firing"
        );
    }

    #[tokio::test]
    async fn overall_timeout_completion_reports_not_within_time() {
        let (waiter, rx) = Waiter::new(1, None, Duration::from_secs(1));
        waiter.complete_timed_out();

        let result = rx.await.unwrap().unwrap();
        assert!(result.messages.is_empty());
        assert!(!result.completed_within_time);
    }

    #[tokio::test]
    async fn cancelled_completion_carries_the_terminal_cause() {
        let (waiter, rx) = Waiter::new(1, None, Duration::from_secs(1));
        waiter.complete_cancelled(Some(EngineError::LinkClosed));

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, EngineError::LinkClosed));
    }

    #[tokio::test]
    async fn cancelled_completion_without_a_cause_falls_back_to_cancelled() {
        let (waiter, rx) = Waiter::new(1, None, Duration::from_secs(1));
        waiter.complete_cancelled(None);

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
