//! The unsettled-delivery data model and its asynchronous disposition handle.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use fe2o3_amqp_types::{
    definitions::{DeliveryNumber, DeliveryTag},
    messaging::{Body, DeliveryState, FromBody, Message},
};
use pin_project_lite::pin_project;
use serde_amqp::Value;
use tokio::sync::oneshot;

use super::error::EngineError;

/// A message handed to a consumer, carrying enough metadata to dispose of it later.
///
/// `T` is normally [`Value`] — the raw, not-yet-application-decoded body produced by the
/// [assembler](super::assembler) — and is converted into an application type via
/// [`FromBody`] on demand.
#[derive(Debug, Clone)]
pub struct Delivery<T = Value> {
    delivery_id: DeliveryNumber,
    delivery_tag: DeliveryTag,
    message: Message<T>,
    batchable: bool,
}

impl<T> Delivery<T> {
    pub(crate) fn new(
        delivery_id: DeliveryNumber,
        delivery_tag: DeliveryTag,
        message: Message<T>,
        batchable: bool,
    ) -> Self {
        Self {
            delivery_id,
            delivery_tag,
            message,
            batchable,
        }
    }

    /// The delivery-id assigned to this delivery by the peer.
    pub fn delivery_id(&self) -> &DeliveryNumber {
        &self.delivery_id
    }

    /// The opaque delivery-tag that uniquely identifies this delivery on the link.
    pub fn delivery_tag(&self) -> &DeliveryTag {
        &self.delivery_tag
    }

    /// The batchable hint carried on the transfer frame that delivered this message.
    ///
    /// Echoed by [`crate::link::receiver::ReceiverEngine`]'s `accept_message`,
    /// `reject_message`, `release_message`, and `modify_message` helpers when they dispose
    /// of this delivery, per §4.E's "sets m.batchable then delegates to external
    /// disposeDelivery".
    pub fn batchable(&self) -> bool {
        self.batchable
    }

    /// Borrows the assembled message.
    pub fn message(&self) -> &Message<T> {
        &self.message
    }

    /// Consumes the delivery, returning the assembled message.
    pub fn into_message(self) -> Message<T> {
        self.message
    }

    /// Borrows the message body.
    pub fn body(&self) -> &Body<T> {
        &self.message.body
    }
}

impl Delivery<Value> {
    /// Converts the raw body into an application type via [`FromBody`].
    pub fn into_body<B>(self) -> B
    where
        B: for<'de> FromBody<'de, Body = Body<Value>>,
    {
        B::from_body(self.message.body)
    }
}

/// Outcome of an awaited disposition: the peer's final delivery state, or an error if the
/// wait was cancelled, timed out, or the peer returned something other than a terminal
/// outcome.
pub type DispositionOutcome = Result<DeliveryState, EngineError>;

pin_project! {
    /// A future that resolves once the peer has sent back a reciprocating disposition for a
    /// delivery this engine settled asynchronously.
    ///
    /// Modelled as a thin wrapper over a [`oneshot::Receiver`] so that completing it from the
    /// disposition registry never has to run on, or block, the caller's task.
    #[derive(Debug)]
    pub struct DispositionFut {
        #[pin]
        receiver: oneshot::Receiver<DispositionOutcome>,
    }
}

impl DispositionFut {
    pub(crate) fn new(receiver: oneshot::Receiver<DispositionOutcome>) -> Self {
        Self { receiver }
    }
}

impl Future for DispositionFut {
    type Output = DispositionOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.receiver.poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(EngineError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe2o3_amqp_types::messaging::Accepted;

    #[tokio::test]
    async fn disposition_fut_resolves_with_sent_outcome() {
        let (tx, rx) = oneshot::channel();
        let fut = DispositionFut::new(rx);
        tx.send(Ok(DeliveryState::Accepted(Accepted {}))).unwrap();
        let outcome = fut.await.unwrap();
        assert!(outcome.is_accepted());
    }

    #[tokio::test]
    async fn disposition_fut_resolves_cancelled_when_sender_dropped() {
        let (tx, rx) = oneshot::channel::<DispositionOutcome>();
        let fut = DispositionFut::new(rx);
        drop(tx);
        let err = fut.await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
