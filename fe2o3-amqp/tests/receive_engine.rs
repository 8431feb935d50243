//! Integration tests exercising the credit-engine scenarios end to end, against a fake
//! [`ReceiverLinkExternal`] standing in for a host link/session.

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use fe2o3_amqp::{EngineSettings, ReceiverEngine, ReceiverEngineBuilder, ReceiverLinkExternal, SettleType};
use fe2o3_amqp_types::{
    definitions::{self, DeliveryTag},
    messaging::{AmqpValue, Body, DeliveryState, Message},
    performatives::Transfer,
};
use serde_amqp::{ser::to_vec, Value};

struct FakeLink {
    settings: EngineSettings,
    credit: AtomicU32,
    flow_events: Mutex<Vec<u32>>,
}

impl FakeLink {
    fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            credit: AtomicU32::new(0),
            flow_events: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReceiverLinkExternal for FakeLink {
    async fn issue_credit(&self, credit: u32, _drain: bool, _txn_id: Option<Bytes>) {
        self.credit.store(credit, Ordering::SeqCst);
        self.flow_events.lock().unwrap().push(credit);
    }

    async fn send_flow(&self, _echo: bool) {}

    async fn set_total_link_credit(&self, credit: u32, _update_queue: bool, _set_auto_flow: Option<bool>) {
        self.credit.store(credit, Ordering::SeqCst);
        self.flow_events.lock().unwrap().push(credit);
    }

    async fn dispose_delivery(
        &self,
        _tag: &DeliveryTag,
        _settled: bool,
        _state: DeliveryState,
        _batchable: bool,
    ) -> bool {
        true
    }

    fn terminal_exception(&self) -> Option<definitions::Error> {
        None
    }

    fn is_closing(&self) -> bool {
        false
    }

    fn link_credit(&self) -> u32 {
        self.credit.load(Ordering::SeqCst)
    }

    fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

fn transfer(delivery_id: u32, tag: &[u8]) -> Transfer {
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
        batchable: false,
    }
}

fn encoded_message(payload: &str) -> Bytes {
    let message = Message {
        header: None,
        delivery_annotations: None,
        message_annotations: None,
        properties: None,
        application_properties: None,
        body: Body::Value(AmqpValue(Value::String(payload.to_string()))),
        footer: None,
    };
    Bytes::from(to_vec(&fe2o3_amqp_types::messaging::message::__private::Serializable(message)).unwrap())
}

/// Scenario 1: prefetch idle drain. Four 256 KiB messages arrive against a 1 MiB budget,
/// exhausting credit; draining two via `begin_receive` recovers credit to 2.
#[tokio::test]
async fn prefetch_idle_drain_recovers_credit_after_two_dequeues() {
    let settings = ReceiverEngineBuilder::new()
        .total_cache_size_in_bytes(Some(1024 * 1024))
        .total_link_credit(0)
        .build();
    let engine = ReceiverEngine::new(FakeLink::new(settings));
    engine.open().await;

    let msg_size = 256 * 1024usize;
    for i in 0..4u32 {
        let payload = "x".repeat(msg_size - 64);
        let encoded = encoded_message(&payload);
        let t = transfer(i, format!("tag-{i}").as_bytes());
        engine.on_transfer(&t, encoded).await.unwrap();
    }
    assert_eq!(engine.external().link_credit(), 0);

    for _ in 0..2 {
        let result = engine.begin_receive(1, None, Duration::from_secs(1)).await.unwrap();
        assert_eq!(result.messages.len(), 1);
    }
    assert!(engine.external().link_credit() >= 2);
}

/// Scenario 2: on-demand singleton batching. With auto-credit off, 25 single-message waiters
/// enrol; credit follows the batch-threshold gating instead of issuing per-waiter.
#[tokio::test]
async fn on_demand_singleton_batching_gates_on_threshold() {
    let settings = ReceiverEngineBuilder::new()
        .auto_send_flow(false)
        .batch_threshold(20)
        .build();
    let engine = ReceiverEngine::new(FakeLink::new(settings));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.begin_receive(1, None, Duration::from_secs(5)).await
        }));
        tokio::task::yield_now().await;
    }
    assert_eq!(engine.external().link_credit(), 20);

    // The 21st waiter should not push credit past the threshold boundary immediately.
    let engine21 = Arc::clone(&engine);
    let h21 = tokio::spawn(async move {
        engine21.begin_receive(1, None, Duration::from_secs(5)).await
    });
    tokio::task::yield_now().await;
    assert_eq!(engine.external().link_credit(), 20, "holds at W=21 until batch boundary");

    engine.abort();
    for h in handles {
        let _ = h.await;
    }
    let _ = h21.await;
}

/// Scenario 3: multi regime. One waiter asks for 50 messages; the engine issues 50 credit
/// immediately (W=1 <= pending_threshold), and the waiter completes once all 50 arrive.
#[tokio::test]
async fn multi_regime_issues_full_request_up_front() {
    let settings = ReceiverEngineBuilder::new().auto_send_flow(false).build();
    let engine = ReceiverEngine::new(FakeLink::new(settings));

    let engine2 = Arc::clone(&engine);
    let handle = tokio::spawn(async move {
        engine2.begin_receive(50, None, Duration::from_secs(5)).await
    });
    tokio::task::yield_now().await;
    assert_eq!(engine.external().link_credit(), 50);

    for i in 0..50u32 {
        let t = transfer(i, format!("tag-{i}").as_bytes());
        engine.on_transfer(&t, encoded_message("x")).await.unwrap();
    }

    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.messages.len(), 50);
    assert!(result.completed_within_time);
}

/// Scenario 4: batch gather timeout. Three messages arrive within 50ms of each other; at
/// 250ms after the first message the waiter completes with those three, on time.
#[tokio::test(start_paused = true)]
async fn batch_gather_timeout_completes_with_partial_batch() {
    let engine = ReceiverEngine::new(FakeLink::new(ReceiverEngineBuilder::new().build()));
    let engine2 = Arc::clone(&engine);
    let handle = tokio::spawn(async move {
        engine2
            .begin_receive(10, Some(Duration::from_millis(200)), Duration::from_secs(10))
            .await
    });
    tokio::task::yield_now().await;

    for i in 0..3u32 {
        let t = transfer(i, format!("tag-{i}").as_bytes());
        engine.on_transfer(&t, encoded_message("x")).await.unwrap();
        tokio::time::advance(Duration::from_millis(15)).await;
    }

    tokio::time::advance(Duration::from_millis(250)).await;
    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.messages.len(), 3);
    assert!(result.completed_within_time);
}

/// Scenario 5: overall timeout. No messages arrive; at 1s the waiter completes empty.
#[tokio::test(start_paused = true)]
async fn overall_timeout_completes_empty_when_nothing_arrives() {
    let engine = ReceiverEngine::new(FakeLink::new(ReceiverEngineBuilder::new().build()));
    let engine2 = Arc::clone(&engine);
    let handle = tokio::spawn(async move {
        engine2
            .begin_receive(10, Some(Duration::from_millis(200)), Duration::from_secs(1))
            .await
    });
    tokio::time::advance(Duration::from_secs(2)).await;

    let result = handle.await.unwrap().unwrap();
    assert!(result.messages.is_empty());
    assert!(!result.completed_within_time);
}

/// Scenario 6: size exceeded during closing. Before closing, an oversized transfer is
/// fatal; afterwards, it is silently discarded.
#[tokio::test]
async fn size_exceeded_is_fatal_before_closing_and_silent_during() {
    let settings = ReceiverEngineBuilder::new().max_message_size(Some(64)).build();
    let engine = ReceiverEngine::new(FakeLink::new(settings));

    let oversized = encoded_message(&"x".repeat(200));
    let t = transfer(0, b"tag-0");
    let err = engine.on_transfer(&t, oversized.clone()).await.unwrap_err();
    assert!(matches!(err, fe2o3_amqp::EngineError::MessageSizeExceeded { .. }));

    engine.close().await;
    let t2 = transfer(1, b"tag-1");
    let result = engine.on_transfer(&t2, oversized).await;
    assert!(result.is_ok());
}

/// A registered message listener bypasses the queue and waiter list entirely.
#[tokio::test]
async fn listener_bypasses_queue_and_waiters() {
    let engine = ReceiverEngine::new(FakeLink::new(ReceiverEngineBuilder::new().build()));
    let received = Arc::new(Mutex::new(Vec::new()));
    let received2 = Arc::clone(&received);
    engine
        .register_listener(Arc::new(move |delivery| {
            received2.lock().unwrap().push(delivery.delivery_tag().clone());
        }))
        .unwrap();

    let t = transfer(0, b"tag-listener");
    engine.on_transfer(&t, encoded_message("x")).await.unwrap();

    assert_eq!(received.lock().unwrap().len(), 1);

    // A second listener registration is rejected while one is installed.
    let err = engine
        .register_listener(Arc::new(|_| {}))
        .unwrap_err();
    assert!(matches!(err, fe2o3_amqp::EngineError::DuplicateListener));
}

/// Unwanted messages (auto-credit off, settle-on-disposition, no waiters) are released
/// rather than queued.
#[tokio::test]
async fn unwanted_messages_are_released_not_queued() {
    let settings = ReceiverEngineBuilder::new()
        .auto_send_flow(false)
        .settle_type(SettleType::SettleOnDisposition)
        .build();
    let engine = ReceiverEngine::new(FakeLink::new(settings));

    let t = transfer(0, b"tag-0");
    engine.on_transfer(&t, encoded_message("x")).await.unwrap();

    // Nothing was buffered: an immediate begin_receive comes back empty.
    let result = engine.begin_receive(1, None, Duration::ZERO).await.unwrap();
    assert!(result.messages.is_empty());
}
