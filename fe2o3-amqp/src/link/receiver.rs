//! Component E: the receiver coordinator that ties flow control, waiter dispatch,
//! disposition tracking, and transfer reassembly together behind a single lock.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use fe2o3_amqp_types::{
    definitions::{self, DeliveryTag},
    messaging::{Accepted, DeliveryState, Modified, Outcome, Rejected, Released},
    performatives::Transfer,
    transaction::TransactionalState,
};
use parking_lot::Mutex;
use tokio::{sync::oneshot, time::Instant};

use super::{
    assembler::Assembler,
    delivery::{Delivery, DispositionFut},
    disposition::{self, DispositionRegistry},
    error::EngineError,
    external::{ReceiverLinkExternal, SettleType},
    flow_queue::FlowQueue,
    waiter::{Dispatch, Waiter, WaiterList, WaiterResult},
};

/// A message listener installed via [`ReceiverEngine::register_listener`].
///
/// Invoked with the coordinator's lock released, so the callback may itself call back into
/// the engine (e.g. to dispose the message) without deadlocking.
pub type MessageListener = Arc<dyn Fn(Delivery) + Send + Sync>;

/// Which deadline a spawned waiter timer is standing in for.
#[derive(Debug, Clone, Copy)]
enum WaiterTimerKind {
    /// The waiter's original overall timeout.
    Overall,
    /// A batch-gather timeout that superseded the overall timeout after the first message
    /// was gathered (§4.B).
    BatchGather,
}

/// Result of a [`ReceiverEngine::begin_receive`] or
/// [`ReceiverEngine::begin_receive_remote_messages`] call.
#[derive(Debug)]
pub struct ReceiveOutcome {
    /// Messages gathered.
    pub messages: Vec<Delivery>,
    /// Whether the batch completed by satisfying the request rather than by timing out.
    pub completed_within_time: bool,
}

impl From<WaiterResult> for ReceiveOutcome {
    fn from(result: WaiterResult) -> Self {
        Self {
            messages: result.messages,
            completed_within_time: result.completed_within_time,
        }
    }
}

/// All mutable state this engine guards behind a single lock (§5's `L`).
struct EngineState {
    flow_queue: FlowQueue,
    waiters: WaiterList,
    assembler: Assembler,
    disposition: DispositionRegistry,
    listener: Option<MessageListener>,
    closing: bool,
}

/// The receive-side credit engine of an AMQP 1.0 link.
///
/// Coordinates the prefetch buffer ([`FlowQueue`]), the FIFO of pending `begin_receive`
/// calls ([`WaiterList`]), the disposition registry, and the transfer assembler, all behind
/// one `parking_lot::Mutex`. The lock is always released before calling into the host link
/// surface (via [`ReceiverLinkExternal`]) or awaiting anything, so host callbacks and waiter
/// completions never re-enter the engine while it holds the lock.
///
/// Always held as `Arc<ReceiverEngine<L>>` (see [`Self::new`]) — per-waiter and
/// per-disposition timers need an owned handle that outlives the call that armed them.
pub struct ReceiverEngine<L: ReceiverLinkExternal> {
    external: L,
    state: Mutex<EngineState>,
}

impl<L: ReceiverLinkExternal> std::fmt::Debug for ReceiverEngine<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverEngine").finish_non_exhaustive()
    }
}

impl<L: ReceiverLinkExternal> ReceiverEngine<L> {
    /// Creates a new engine around `external`, not yet opened.
    pub fn new(external: L) -> Arc<Self> {
        let settings = external.settings().clone();
        let flow_queue = FlowQueue::with_max_credit_per_flow(
            settings.total_cache_size_in_bytes,
            settings.max_credit_per_flow,
        );
        Arc::new(Self {
            external,
            state: Mutex::new(EngineState {
                flow_queue,
                waiters: WaiterList::new(),
                assembler: Assembler::new(),
                disposition: DispositionRegistry::new(),
                listener: None,
                closing: false,
            }),
        })
    }

    /// Borrows the host collaborator.
    pub fn external(&self) -> &L {
        &self.external
    }

    /// Opens the engine: issues the initial flow if the negotiated starting credit is
    /// non-zero, and primes size-based credit if the link is in size mode.
    pub async fn open(&self) {
        let settings = self.external.settings();
        let initial_credit = settings.total_link_credit;
        let size_mode = settings.total_cache_size_in_bytes.is_some();

        let bounded = {
            let mut state = self.state.lock();
            if state.flow_queue.is_size_mode() {
                state.flow_queue.update_credit(None);
                state.flow_queue.bounded_credit()
            } else {
                0
            }
        };

        let credit = if size_mode { bounded } else { initial_credit };
        if credit > 0 {
            self.external.issue_credit(credit, false, None).await;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(credit, "receiver engine opened");
        #[cfg(feature = "log")]
        log::debug!("receiver engine opened, credit = {}", credit);
    }

    /// Recomputes size-based credit after the peer's attach confirms its negotiated
    /// `max-message-size`, re-issuing a flow if the derived credit changed.
    pub async fn on_attach_confirmed(&self) {
        let (changed, credit) = {
            let mut state = self.state.lock();
            let changed = state.flow_queue.update_credit(None);
            (changed, state.flow_queue.bounded_credit())
        };
        if changed {
            self.external.set_total_link_credit(credit, true, None).await;
        }
    }

    /// Installs a single message listener; incoming messages are then delivered directly to
    /// it rather than queued or dispatched to waiters. Fails if one is already installed.
    pub fn register_listener(&self, listener: MessageListener) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.listener.is_some() {
            return Err(EngineError::DuplicateListener);
        }
        state.listener = Some(listener);
        Ok(())
    }

    /// Removes any installed message listener.
    pub fn remove_listener(&self) {
        self.state.lock().listener = None;
    }

    /// Updates the size-based cache budget, recomputing credit if the queue is non-empty.
    pub async fn set_cache_bytes(&self, total_cache_bytes: Option<u64>) {
        let (changed, credit) = {
            let mut state = self.state.lock();
            let changed = state.flow_queue.set_budget(total_cache_bytes);
            (changed, state.flow_queue.bounded_credit())
        };
        if changed {
            self.external.set_total_link_credit(credit, true, None).await;
        }
    }

    /// Drains up to `n` buffered messages synchronously, or enrols a waiter that resolves once
    /// `n` messages are gathered, `batch_wait` has elapsed since the first gather, or `overall`
    /// elapses. An `overall` of [`Duration::ZERO`] returns immediately with whatever (if
    /// anything) was already buffered.
    pub async fn begin_receive(
        self: &Arc<Self>,
        n: usize,
        batch_wait: Option<Duration>,
        overall: Duration,
    ) -> Result<ReceiveOutcome, EngineError> {
        self.begin_receive_inner(n, batch_wait, overall).await
    }

    /// Same as [`Self::begin_receive`], but clamps a zero `overall` up to a 10 second minimum
    /// wait, mirroring a blocking remote-service call rather than a non-blocking poll.
    pub async fn begin_receive_remote_messages(
        self: &Arc<Self>,
        n: usize,
        batch_wait: Option<Duration>,
        overall: Duration,
    ) -> Result<ReceiveOutcome, EngineError> {
        const MIN_REMOTE_WAIT: Duration = Duration::from_secs(10);
        let overall = if overall.is_zero() { MIN_REMOTE_WAIT } else { overall };
        self.begin_receive_inner(n, batch_wait, overall).await
    }

    async fn begin_receive_inner(
        self: &Arc<Self>,
        n: usize,
        batch_wait: Option<Duration>,
        overall: Duration,
    ) -> Result<ReceiveOutcome, EngineError> {
        if let Some(err) = self.external.terminal_exception() {
            return Err(EngineError::IllegalState(format!("{err:?}")));
        }

        enum Immediate {
            Drained(Vec<Delivery>),
            Enrolled {
                rx: oneshot::Receiver<Result<WaiterResult, EngineError>>,
                id: u64,
                generation: u64,
                deadline: Instant,
                credit_update: Option<u32>,
                issue: Option<u32>,
            },
        }

        let outcome = {
            let mut state = self.state.lock();
            if state.closing {
                return Err(EngineError::LinkClosed);
            }

            let mut drained = Vec::new();
            let mut credit_changed = false;
            while drained.len() < n.max(1) {
                let (message, changed) = state.flow_queue.dequeue();
                credit_changed |= changed;
                match message {
                    Some(message) => drained.push(message),
                    None => break,
                }
            }

            if !drained.is_empty() {
                Immediate::Drained(drained)
            } else if overall.is_zero() {
                Immediate::Drained(Vec::new())
            } else {
                let (waiter, rx) = Waiter::new(n, batch_wait, overall);
                let deadline = waiter.overall_deadline();
                let id = state.waiters.enrol(waiter);
                let generation = state.waiters.generation_of(id).unwrap_or(0);
                let issue = if !self.external.settings().auto_send_flow {
                    self.compute_on_demand_credit_locked(&state)
                } else {
                    None
                };
                let credit_update = credit_changed.then(|| state.flow_queue.bounded_credit());
                Immediate::Enrolled { rx, id, generation, deadline, credit_update, issue }
            }
        };

        match outcome {
            Immediate::Drained(messages) => {
                let completed_within_time = !messages.is_empty() || overall.is_zero();
                Ok(ReceiveOutcome { messages, completed_within_time })
            }
            Immediate::Enrolled { rx, id, generation, deadline, credit_update, issue } => {
                if let Some(credit) = credit_update {
                    self.external.set_total_link_credit(credit, true, None).await;
                }
                self.spawn_waiter_timer(id, generation, deadline, WaiterTimerKind::Overall);
                if let Some(credit) = issue {
                    self.external.issue_credit(credit, false, None).await;
                }
                match rx.await {
                    Ok(Ok(result)) => Ok(result.into()),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(EngineError::Cancelled),
                }
            }
        }
    }

    /// §4.E.1: on-demand credit, computed with the lock held. Returns the absolute total
    /// credit to issue, if any.
    fn compute_on_demand_credit_locked(&self, state: &EngineState) -> Option<u32> {
        let settings = self.external.settings();
        let current = self.external.link_credit();
        let w = state.waiters.len() as u32;
        if w == 0 {
            return None;
        }
        let r = state.waiters.total_requested() as u32;
        let max_od = settings.max_on_demand_credit;
        let batch_threshold = settings.batch_threshold.max(1);
        let pending_threshold = settings.pending_threshold.max(1);

        if state.waiters.is_singleton_regime() {
            if w > current && current < max_od {
                let need = w.min(max_od) - current;
                let should_issue =
                    w <= batch_threshold || current == 0 || need % batch_threshold == 0;
                if should_issue {
                    return Some(current + need);
                }
            }
        } else if r > current {
            let need = r - current;
            let should_issue =
                w <= pending_threshold || current == 0 || w % pending_threshold == 0;
            if should_issue {
                return Some(current + need);
            }
        }
        None
    }

    /// Spawns the per-waiter timeout task. On firing, checks the waiter's still-armed
    /// generation matches before completing it — a stale timer from a since superseded
    /// (rearmed) deadline is a no-op. `kind` distinguishes the waiter's *overall* deadline
    /// (completes not-within-time) from a rearmed *batch-gather* deadline (still counts as
    /// within time per §4.B).
    fn spawn_waiter_timer(
        self: &Arc<Self>,
        id: u64,
        generation: u64,
        deadline: Instant,
        kind: WaiterTimerKind,
    ) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let waiter = {
                let mut state = engine.state.lock();
                if state.waiters.generation_of(id) != Some(generation) {
                    return;
                }
                state.waiters.remove(id)
            };
            if let Some(waiter) = waiter {
                match kind {
                    WaiterTimerKind::Overall => waiter.complete_timed_out(),
                    WaiterTimerKind::BatchGather => waiter.complete_batch_gathered(),
                }
            }
        });
    }

    /// Feeds one transfer frame into the assembler, dispatching the reassembled message (if
    /// the frame completed one) per §4.E.2.
    pub async fn on_transfer(
        self: &Arc<Self>,
        transfer: &Transfer,
        payload: Bytes,
    ) -> Result<(), EngineError> {
        let max_message_size = self.external.settings().max_message_size;
        let is_closing = self.external.is_closing();

        let assembled = {
            let mut state = self.state.lock();
            state
                .assembler
                .on_transfer(transfer, payload, max_message_size, is_closing)?
        };

        if let Some((delivery, size)) = assembled {
            self.on_message(delivery, size).await;
        }
        Ok(())
    }

    /// §4.E.2: dispatches a freshly reassembled message to a listener, a waiter, or the
    /// prefetch queue.
    async fn on_message(self: &Arc<Self>, delivery: Delivery, size: u64) {
        enum Action {
            Listener(MessageListener, Delivery),
            Satisfied {
                waiter: Waiter,
                credit_update: Option<u32>,
                issue: Option<u32>,
            },
            Rearmed {
                id: u64,
                generation: u64,
                deadline: Instant,
                credit_update: Option<u32>,
            },
            Gathered {
                credit_update: Option<u32>,
            },
            Unwanted(Delivery),
            Enqueued {
                credit_update: Option<u32>,
            },
        }

        let action = {
            let mut state = self.state.lock();

            if let Some(listener) = state.listener.clone() {
                Action::Listener(listener, delivery)
            } else if !state.waiters.is_empty() {
                let credit_update = if state.flow_queue.is_size_mode() {
                    state
                        .flow_queue
                        .update_credit(Some(size))
                        .then(|| state.flow_queue.bounded_credit())
                } else {
                    None
                };
                match state.waiters.dispatch(delivery) {
                    Dispatch::Satisfied(waiter) => {
                        let issue = if !self.external.settings().auto_send_flow {
                            self.compute_on_demand_credit_locked(&state)
                        } else {
                            None
                        };
                        Action::Satisfied { waiter, credit_update, issue }
                    }
                    Dispatch::Rearm { id, generation, deadline } => {
                        Action::Rearmed { id, generation, deadline, credit_update }
                    }
                    Dispatch::Gathered => Action::Gathered { credit_update },
                }
            } else if !self.external.settings().auto_send_flow
                && self.external.settings().settle_type != SettleType::SettleOnSend
            {
                Action::Unwanted(delivery)
            } else {
                let credit_update = state
                    .flow_queue
                    .enqueue(delivery, size)
                    .then(|| state.flow_queue.bounded_credit());
                Action::Enqueued { credit_update }
            }
        };

        match action {
            Action::Listener(listener, delivery) => listener(delivery),
            Action::Satisfied { waiter, credit_update, issue } => {
                if let Some(credit) = credit_update {
                    self.external.set_total_link_credit(credit, true, None).await;
                }
                waiter.complete_signalled();
                if let Some(credit) = issue {
                    self.external.issue_credit(credit, false, None).await;
                }
            }
            Action::Rearmed { id, generation, deadline, credit_update } => {
                if let Some(credit) = credit_update {
                    self.external.set_total_link_credit(credit, true, None).await;
                }
                self.spawn_waiter_timer(id, generation, deadline, WaiterTimerKind::BatchGather);
            }
            Action::Gathered { credit_update } => {
                if let Some(credit) = credit_update {
                    self.external.set_total_link_credit(credit, true, None).await;
                }
            }
            Action::Unwanted(delivery) => {
                self.release_and_dispose(&delivery).await;
            }
            Action::Enqueued { credit_update } => {
                if let Some(credit) = credit_update {
                    self.external.set_total_link_credit(credit, true, None).await;
                }
            }
        }
    }

    async fn release_and_dispose(&self, delivery: &Delivery) {
        self.external
            .dispose_delivery(
                delivery.delivery_tag(),
                true,
                DeliveryState::Released(Released {}),
                false,
            )
            .await;
    }

    /// Fire-and-forget: accepts `delivery`, settling per the link's configured settle type.
    pub async fn accept_message(&self, delivery: &Delivery) -> bool {
        self.dispose_message(delivery, DeliveryState::Accepted(Accepted {}), delivery.batchable())
            .await
    }

    /// Fire-and-forget: rejects `delivery` with `error`.
    pub async fn reject_message(
        &self,
        delivery: &Delivery,
        error: Option<definitions::Error>,
    ) -> bool {
        self.dispose_message(
            delivery,
            DeliveryState::Rejected(Rejected { error }),
            delivery.batchable(),
        )
        .await
    }

    /// Fire-and-forget: releases `delivery` back to the peer unconsumed.
    pub async fn release_message(&self, delivery: &Delivery) -> bool {
        self.dispose_message(delivery, DeliveryState::Released(Released {}), delivery.batchable())
            .await
    }

    /// Fire-and-forget: modifies `delivery`'s outcome, e.g. to retry elsewhere or annotate it.
    pub async fn modify_message(
        &self,
        delivery: &Delivery,
        delivery_failed: Option<bool>,
        undeliverable_here: Option<bool>,
        message_annotations: Option<fe2o3_amqp_types::definitions::Fields>,
    ) -> bool {
        let state = DeliveryState::Modified(Modified {
            delivery_failed,
            undeliverable_here,
            message_annotations,
        });
        self.dispose_message(delivery, state, delivery.batchable()).await
    }

    /// Fire-and-forget disposition with an explicit outcome and batchable hint.
    pub async fn dispose_message(
        &self,
        delivery: &Delivery,
        state: DeliveryState,
        batchable: bool,
    ) -> bool {
        let settled = self.external.settings().settle_type == SettleType::SettleOnSend;
        self.external
            .dispose_delivery(delivery.delivery_tag(), settled, state, batchable)
            .await
    }

    /// Awaitable disposition (§4.C): registers the tag, sends the initial disposition,
    /// and resolves once the peer reciprocates, times out, or the engine is aborted.
    pub async fn dispose_message_async(
        self: &Arc<Self>,
        tag: DeliveryTag,
        txn_id: Option<Bytes>,
        outcome: Outcome,
        batchable: bool,
        timeout: Duration,
    ) -> Result<DeliveryState, EngineError> {
        let state_to_send = match txn_id {
            Some(ref txn_id) => DeliveryState::TransactionalState(TransactionalState {
                txn_id: txn_id.to_vec().into(),
                outcome: Some(outcome),
            }),
            None => DeliveryState::from(outcome),
        };

        let fut: DispositionFut = {
            let mut guard = self.state.lock();
            guard.disposition.start(tag.clone())?
        };

        let found = self
            .external
            .dispose_delivery(&tag, false, state_to_send, batchable)
            .await;

        if !found {
            self.state.lock().disposition.fail_not_found(&tag);
            return fut.await;
        }

        let engine = Arc::clone(self);
        let tag_for_timeout = tag.clone();
        tokio::spawn(disposition::arm_timeout(tag_for_timeout, timeout, move |tag| {
            engine.state.lock().disposition.on_timeout(tag);
        }));

        fut.await
    }

    /// Resolves a pending disposition with the peer's reported state.
    pub fn on_peer_disposition(&self, tag: &DeliveryTag, state: &DeliveryState) {
        self.state.lock().disposition.on_peer_disposition(tag, state);
    }

    /// Graceful close (§4.E.3): releases every buffered message back to the peer, completes
    /// every waiter with an empty, non-timely result, and aborts any pending dispositions.
    pub async fn close(&self) {
        let (buffered, waiters) = {
            let mut state = self.state.lock();
            state.closing = true;
            let mut buffered = Vec::new();
            loop {
                let (message, _) = state.flow_queue.dequeue();
                match message {
                    Some(message) => buffered.push(message),
                    None => break,
                }
            }
            let waiters = state.waiters.drain_all();
            state.disposition.abort();
            (buffered, waiters)
        };

        for delivery in &buffered {
            self.release_and_dispose(delivery).await;
        }
        for waiter in waiters {
            waiter.complete_timed_out();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(released = buffered.len(), "receiver engine closed");
        #[cfg(feature = "log")]
        log::debug!("receiver engine closed, released {} buffered messages", buffered.len());
    }

    /// Abrupt abort (§4.E.3): drops every buffered message without a disposition, cancels
    /// every waiter, aborts pending dispositions, and resets the assembler's reassembly
    /// state.
    pub fn abort(&self) {
        let cause = self
            .external
            .terminal_exception()
            .map(|err| EngineError::IllegalState(format!("{err:?}")));
        let mut state = self.state.lock();
        state.closing = true;
        let waiters = state.waiters.drain_all();
        state.disposition.abort();
        state.assembler.reset();
        drop(state);
        for waiter in waiters {
            waiter.complete_cancelled(cause.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::builder::ReceiverEngineBuilder;
    use crate::link::external::EngineSettings;
    use fe2o3_amqp_types::messaging::{AmqpValue, Body, Message};
    use serde_amqp::{ser::to_vec, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    struct FakeExternal {
        settings: EngineSettings,
        credit: AtomicU32,
        disposed: StdMutex<Vec<(DeliveryTag, bool, DeliveryState, bool)>>,
        known_tags: StdMutex<Vec<DeliveryTag>>,
        closing: std::sync::atomic::AtomicBool,
    }

    impl FakeExternal {
        fn new(settings: EngineSettings) -> Self {
            Self {
                settings,
                credit: AtomicU32::new(0),
                disposed: StdMutex::new(Vec::new()),
                known_tags: StdMutex::new(Vec::new()),
                closing: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn learn_tag(&self, tag: DeliveryTag) {
            self.known_tags.lock().unwrap().push(tag);
        }
    }

    #[async_trait::async_trait]
    impl ReceiverLinkExternal for FakeExternal {
        async fn issue_credit(&self, credit: u32, _drain: bool, _txn_id: Option<Bytes>) {
            self.credit.store(credit, Ordering::SeqCst);
        }

        async fn send_flow(&self, _echo: bool) {}

        async fn set_total_link_credit(
            &self,
            credit: u32,
            _update_queue: bool,
            _set_auto_flow: Option<bool>,
        ) {
            self.credit.store(credit, Ordering::SeqCst);
        }

        async fn dispose_delivery(
            &self,
            tag: &DeliveryTag,
            settled: bool,
            state: DeliveryState,
            batchable: bool,
        ) -> bool {
            let known = self.known_tags.lock().unwrap().iter().any(|t| t == tag);
            if known {
                self.disposed
                    .lock()
                    .unwrap()
                    .push((tag.clone(), settled, state, batchable));
            }
            known
        }

        fn terminal_exception(&self) -> Option<definitions::Error> {
            None
        }

        fn is_closing(&self) -> bool {
            self.closing.load(Ordering::SeqCst)
        }

        fn link_credit(&self) -> u32 {
            self.credit.load(Ordering::SeqCst)
        }

        fn settings(&self) -> &EngineSettings {
            &self.settings
        }
    }

    fn fake_transfer(delivery_id: u32, tag: &[u8]) -> Transfer {
        fake_transfer_with_batchable(delivery_id, tag, false)
    }

    fn fake_transfer_with_batchable(delivery_id: u32, tag: &[u8], batchable: bool) -> Transfer {
        Transfer {
            handle: 0.into(),
            delivery_id: Some(delivery_id),
            delivery_tag: Some(tag.to_vec().into()),
            message_format: Some(0),
            settled: Some(false),
            more: false,
            rcv_settle_mode: None,
            state: None,
            resume: false,
            aborted: false,
            batchable,
        }
    }

    fn encode(value: Value) -> Bytes {
        let message = Message {
            header: None,
            delivery_annotations: None,
            message_annotations: None,
            properties: None,
            application_properties: None,
            body: Body::Value(AmqpValue(value)),
            footer: None,
        };
        Bytes::from(to_vec(&fe2o3_amqp_types::messaging::message::__private::Serializable(message)).unwrap())
    }

    fn engine(settings: EngineSettings) -> Arc<ReceiverEngine<FakeExternal>> {
        ReceiverEngine::new(FakeExternal::new(settings))
    }

    #[tokio::test]
    async fn enqueues_when_no_waiter_and_auto_credit_on() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let transfer = fake_transfer(0, b"t1");
        engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();

        let received = engine.begin_receive(1, None, Duration::from_millis(10)).await.unwrap();
        assert_eq!(received.messages.len(), 1);
        assert!(received.completed_within_time);
    }

    #[tokio::test]
    async fn begin_receive_drains_before_enrolling() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        for i in 0..3u32 {
            let transfer = fake_transfer(i, format!("t{i}").as_bytes());
            engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();
        }
        let received = engine.begin_receive(2, None, Duration::from_millis(10)).await.unwrap();
        assert_eq!(received.messages.len(), 2);
    }

    #[tokio::test]
    async fn waiting_waiter_is_satisfied_by_arriving_message() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let engine2 = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            engine2.begin_receive(1, None, Duration::from_secs(5)).await
        });
        tokio::task::yield_now().await;

        let transfer = fake_transfer(0, b"t1");
        engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();

        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.messages.len(), 1);
        assert!(result.completed_within_time);
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout_completes_waiter_empty() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let engine2 = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            engine2.begin_receive(1, None, Duration::from_secs(1)).await
        });
        tokio::time::advance(Duration::from_secs(2)).await;
        let result = handle.await.unwrap().unwrap();
        assert!(result.messages.is_empty());
        assert!(!result.completed_within_time);
    }

    #[tokio::test]
    async fn zero_overall_returns_immediately_on_begin_receive() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let result = engine.begin_receive(1, None, Duration::ZERO).await.unwrap();
        assert!(result.messages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_overall_clamps_to_ten_seconds_on_remote_messages() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let engine2 = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            engine2.begin_receive_remote_messages(1, None, Duration::ZERO).await
        });
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!handle.is_finished());
        tokio::time::advance(Duration::from_secs(6)).await;
        let result = handle.await.unwrap().unwrap();
        assert!(result.messages.is_empty());
        assert!(!result.completed_within_time);
    }

    #[tokio::test]
    async fn unwanted_message_is_released_when_auto_credit_off_and_settle_on_disposition() {
        let settings = ReceiverEngineBuilder::new()
            .auto_send_flow(false)
            .settle_type(SettleType::SettleOnDisposition)
            .build();
        let engine = engine(settings);
        engine.external().learn_tag(b"t1".to_vec().into());

        let transfer = fake_transfer(0, b"t1");
        engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();

        let disposed = engine.external().disposed.lock().unwrap();
        assert_eq!(disposed.len(), 1);
        assert!(disposed[0].2.is_released());
    }

    #[tokio::test]
    async fn accept_message_sends_accepted_disposition() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let transfer = fake_transfer(0, b"t1");
        engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();
        let received = engine.begin_receive(1, None, Duration::from_millis(10)).await.unwrap();
        let delivery = &received.messages[0];
        engine.external().learn_tag(delivery.delivery_tag().clone());

        assert!(engine.accept_message(delivery).await);
        let disposed = engine.external().disposed.lock().unwrap();
        assert!(disposed[0].2.is_accepted());
    }

    #[tokio::test]
    async fn accept_message_echoes_the_deliverys_own_batchable_flag() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let transfer = fake_transfer_with_batchable(0, b"t1", true);
        engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();
        let received = engine.begin_receive(1, None, Duration::from_millis(10)).await.unwrap();
        let delivery = &received.messages[0];
        assert!(delivery.batchable());
        engine.external().learn_tag(delivery.delivery_tag().clone());

        assert!(engine.accept_message(delivery).await);
        let disposed = engine.external().disposed.lock().unwrap();
        assert!(disposed[0].3, "accept_message should echo the delivery's batchable flag");
    }

    #[tokio::test]
    async fn dispose_message_async_resolves_on_peer_disposition() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let tag: DeliveryTag = b"t1".to_vec().into();
        engine.external().learn_tag(tag.clone());

        let engine2 = Arc::clone(&engine);
        let tag2 = tag.clone();
        let handle = tokio::spawn(async move {
            engine2
                .dispose_message_async(
                    tag2,
                    None,
                    Outcome::Accepted(Accepted {}),
                    false,
                    Duration::from_secs(5),
                )
                .await
        });
        tokio::task::yield_now().await;
        engine.on_peer_disposition(&tag, &DeliveryState::Accepted(Accepted {}));

        let result = handle.await.unwrap().unwrap();
        assert!(result.is_accepted());
    }

    #[tokio::test]
    async fn dispose_message_async_fails_not_found_when_tag_unknown() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let tag: DeliveryTag = b"unknown".to_vec().into();
        let err = engine
            .dispose_message_async(
                tag,
                None,
                Outcome::Accepted(Accepted {}),
                false,
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }

    #[tokio::test]
    async fn close_releases_buffered_messages_and_empties_waiters() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let transfer = fake_transfer(0, b"t1");
        engine.on_transfer(&transfer, encode(Value::Bool(true))).await.unwrap();
        engine.external().learn_tag(b"t1".to_vec().into());

        engine.close().await;
        let disposed = engine.external().disposed.lock().unwrap();
        assert_eq!(disposed.len(), 1);
        assert!(disposed[0].2.is_released());
        assert!(disposed[0].1, "closed deliveries are settled");
    }

    #[tokio::test]
    async fn abort_cancels_waiters_without_disposing_buffered_messages() {
        let engine = engine(ReceiverEngineBuilder::new().build());
        let engine2 = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            engine2.begin_receive(1, None, Duration::from_secs(5)).await
        });
        tokio::task::yield_now().await;

        engine.abort();
        assert!(matches!(handle.await.unwrap(), Err(EngineError::Cancelled)));
        assert!(engine.external().disposed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn on_demand_credit_issues_immediately_for_small_singleton_batch() {
        let settings = ReceiverEngineBuilder::new().auto_send_flow(false).build();
        let engine = engine(settings);
        let engine2 = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            engine2.begin_receive(1, None, Duration::from_secs(5)).await
        });
        tokio::task::yield_now().await;
        assert_eq!(engine.external().link_credit(), 1);
        engine.abort();
        let _ = handle.await;
    }
}
