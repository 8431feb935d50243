//! Component C: the registry of in-flight, asynchronously-awaited dispositions.

use std::{collections::BTreeMap, time::Duration};

use fe2o3_amqp_types::{definitions::DeliveryTag, messaging::DeliveryState};
use tokio::{sync::oneshot, time};

use super::{
    delivery::{DispositionFut, DispositionOutcome},
    error::EngineError,
};

struct PendingDisposition {
    sender: oneshot::Sender<DispositionOutcome>,
}

/// Tracks deliveries this engine has settled asynchronously and is waiting for the peer to
/// reciprocate on, keyed by delivery-tag.
///
/// At most one disposition may be pending per tag at a time; `L` (the coordinator's lock,
/// see [`crate::link::receiver`]) is never held while awaiting the returned
/// [`DispositionFut`] — only while registering or resolving an entry.
#[derive(Debug, Default)]
pub struct DispositionRegistry {
    pending: BTreeMap<DeliveryTag, PendingDisposition>,
}

impl DispositionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }

    /// Registers a new pending disposition for `tag`, returning the future the caller
    /// awaits for the peer's reply. Fails with [`EngineError::IllegalState`] if a
    /// disposition is already pending for this tag.
    pub fn start(&mut self, tag: DeliveryTag) -> Result<DispositionFut, EngineError> {
        if self.pending.contains_key(&tag) {
            return Err(EngineError::IllegalState(
                "a disposition is already pending for this delivery tag".to_string(),
            ));
        }
        let (tx, rx) = oneshot::channel();
        self.pending.insert(tag, PendingDisposition { sender: tx });
        Ok(DispositionFut::new(rx))
    }

    /// Completes the pending disposition for `tag` with an immediate failure, used when the
    /// external link surface reports the tag is not a known unsettled delivery.
    pub fn fail_not_found(&mut self, tag: &DeliveryTag) {
        if let Some(entry) = self.pending.remove(tag) {
            let _ = entry.sender.send(Err(EngineError::NotFound));
        }
    }

    /// Resolves the pending disposition for `tag` with the peer's reported state.
    ///
    /// A `Received` progress marker is ignored and the registration remains pending. A
    /// `TransactionalState` is unwrapped to its carried provisional outcome — the waiter
    /// was given an `Outcome` to dispose with, not a transactional wrapper, so it should
    /// see the same shape back. Anything else that isn't a terminal outcome fails the
    /// waiter with [`EngineError::IllegalState`].
    pub fn on_peer_disposition(&mut self, tag: &DeliveryTag, state: &DeliveryState) {
        let resolved = match state {
            DeliveryState::Received(_) => return,
            DeliveryState::TransactionalState(txn) => match &txn.outcome {
                Some(outcome) => Ok(DeliveryState::from(outcome.clone())),
                None => Err(EngineError::IllegalState(
                    "peer's transactional state carried no provisional outcome".to_string(),
                )),
            },
            _ if state.is_terminal() => Ok(state.clone()),
            other => Err(EngineError::IllegalState(format!(
                "peer returned a non-terminal, non-transactional delivery state: {other:?}"
            ))),
        };
        if let Some(entry) = self.pending.remove(tag) {
            let _ = entry.sender.send(resolved);
        }
    }

    /// Fails the pending disposition for `tag` with a timeout, if it is still pending.
    /// Does nothing if a peer disposition already won the race.
    pub fn on_timeout(&mut self, tag: &DeliveryTag) {
        if let Some(entry) = self.pending.remove(tag) {
            let _ = entry.sender.send(Err(EngineError::Timeout));
        }
    }

    /// Drains every pending entry and fails each with a cancellation error, e.g. on link
    /// abort.
    pub fn abort(&mut self) {
        for (_, entry) in std::mem::take(&mut self.pending) {
            let _ = entry.sender.send(Err(EngineError::Cancelled));
        }
    }

    /// Number of dispositions currently pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether any dispositions are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Spawns the timeout side-task for a disposition: after `timeout` elapses, removes the
/// entry (if it's still pending) from a registry reachable through `with_registry`.
pub async fn arm_timeout<F>(tag: DeliveryTag, timeout: Duration, with_registry: F)
where
    F: FnOnce(&DeliveryTag) + Send + 'static,
{
    time::sleep(timeout).await;
    with_registry(&tag);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe2o3_amqp_types::messaging::Accepted;

    fn tag(b: &[u8]) -> DeliveryTag {
        b.to_vec().into()
    }

    #[tokio::test]
    async fn resolves_with_peer_outcome() {
        let mut registry = DispositionRegistry::new();
        let fut = registry.start(tag(b"t1")).unwrap();
        registry.on_peer_disposition(&tag(b"t1"), &DeliveryState::Accepted(Accepted {}));
        let outcome = fut.await.unwrap();
        assert!(outcome.is_accepted());
    }

    #[test]
    fn duplicate_start_is_rejected() {
        let mut registry = DispositionRegistry::new();
        let _fut = registry.start(tag(b"t1")).unwrap();
        assert!(registry.start(tag(b"t1")).is_err());
    }

    #[tokio::test]
    async fn abort_cancels_all_pending() {
        let mut registry = DispositionRegistry::new();
        let fut1 = registry.start(tag(b"t1")).unwrap();
        let fut2 = registry.start(tag(b"t2")).unwrap();
        registry.abort();
        assert!(matches!(fut1.await, Err(EngineError::Cancelled)));
        assert!(matches!(fut2.await, Err(EngineError::Cancelled)));
    }

    #[tokio::test]
    async fn non_terminal_state_does_not_complete() {
        let mut registry = DispositionRegistry::new();
        let fut = registry.start(tag(b"t1")).unwrap();
        let received = DeliveryState::Received(fe2o3_amqp_types::messaging::Received {
            section_number: 0,
            section_offset: 0,
        });
        registry.on_peer_disposition(&tag(b"t1"), &received);
        assert_eq!(registry.len(), 1);
        registry.on_timeout(&tag(b"t1"));
        assert!(matches!(fut.await, Err(EngineError::Timeout)));
    }
}
