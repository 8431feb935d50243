//! Component D: multi-frame transfer reassembly.

use bytes::{Bytes, BytesMut};
use fe2o3_amqp_types::{
    definitions::{DeliveryNumber, DeliveryTag},
    messaging::{message::__private::Deserializable, Message},
    performatives::Transfer,
};
use serde_amqp::Value;

use super::{delivery::Delivery, error::EngineError};

struct InProgress {
    delivery_id: DeliveryNumber,
    delivery_tag: DeliveryTag,
    buffer: BytesMut,
}

/// Reassembles the transfer frames of a single link into complete messages.
///
/// Holds at most one in-progress reassembly at a time — AMQP forbids interleaving
/// transfers for different deliveries on the same link. `max_message_size` is enforced
/// cumulatively across frames; once a delivery crosses the negotiated cap the assembler
/// reports a fatal error unless the link is already closing, in which case the frame is
/// discarded silently (the peer is tearing down the connection anyway).
#[derive(Debug, Default)]
pub struct Assembler {
    current: Option<InProgress>,
}

impl Assembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Feeds one transfer frame and its payload into the assembler.
    ///
    /// Returns `Ok(Some(delivery))` once the final frame (`more == false`) of a delivery
    /// has been processed and successfully decoded; `Ok(None)` while a delivery is still
    /// being accumulated, or when a frame was silently discarded because the link is
    /// closing; `Err` if the cumulative size would exceed `max_message_size` on an open
    /// link, or the accumulated bytes fail to decode as a message.
    pub fn on_transfer(
        &mut self,
        transfer: &Transfer,
        payload: Bytes,
        max_message_size: Option<u64>,
        is_closing: bool,
    ) -> Result<Option<(Delivery, u64)>, EngineError> {
        let in_progress = match self.current.take() {
            Some(in_progress) => in_progress,
            None => {
                let delivery_id = transfer
                    .delivery_id
                    .ok_or_else(|| EngineError::IllegalState("missing delivery-id".to_string()))?;
                let delivery_tag = transfer
                    .delivery_tag
                    .clone()
                    .ok_or_else(|| EngineError::IllegalState("missing delivery-tag".to_string()))?;
                InProgress {
                    delivery_id,
                    delivery_tag,
                    buffer: BytesMut::new(),
                }
            }
        };

        let InProgress {
            delivery_id,
            delivery_tag,
            mut buffer,
        } = in_progress;

        let prospective_size = buffer.len() as u64 + payload.len() as u64;
        if let Some(max) = max_message_size {
            if max > 0 && prospective_size > max {
                if is_closing {
                    // Discard silently; the link is already tearing down.
                    return Ok(None);
                }
                return Err(EngineError::MessageSizeExceeded {
                    size: prospective_size,
                    max,
                });
            }
        }

        buffer.extend_from_slice(&payload);

        if transfer.more {
            self.current = Some(InProgress {
                delivery_id,
                delivery_tag,
                buffer,
            });
            return Ok(None);
        }

        let size = buffer.len() as u64;
        let decoded: Deserializable<Message<Value>> = serde_amqp::from_slice(&buffer)
            .map_err(|e| EngineError::IllegalState(format!("failed to decode message: {e}")))?;
        let delivery = Delivery::new(delivery_id, delivery_tag, decoded.0, transfer.batchable);
        Ok(Some((delivery, size)))
    }

    /// Discards any in-progress reassembly, e.g. on link abort.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe2o3_amqp_types::messaging::{AmqpValue, Body};
    use serde_amqp::ser::to_vec;

    fn transfer(delivery_id: u32, tag: &[u8], more: bool) -> Transfer {
        transfer_with_batchable(delivery_id, tag, more, false)
    }

    fn transfer_with_batchable(delivery_id: u32, tag: &[u8], more: bool, batchable: bool) -> Transfer {
        Transfer {
            handle: 0.into(),
            delivery_id: Some(delivery_id),
            delivery_tag: Some(tag.to_vec().into()),
            message_format: Some(0),
            settled: Some(false),
            more,
            rcv_settle_mode: None,
            state: None,
            resume: false,
            aborted: false,
            batchable,
        }
    }

    fn encode_message(value: Value) -> Bytes {
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

    #[test]
    fn single_frame_delivery_decodes_immediately() {
        let mut assembler = Assembler::new();
        let payload = encode_message(Value::Bool(true));
        let transfer = transfer(0, b"tag-1", false);
        let (delivery, size) = assembler
            .on_transfer(&transfer, payload.clone(), None, false)
            .unwrap()
            .expect("should complete");
        assert_eq!(size, payload.len() as u64);
        assert_eq!(delivery.delivery_id(), &0);
    }

    #[test]
    fn multi_frame_delivery_waits_for_final_frame() {
        let mut assembler = Assembler::new();
        let payload = encode_message(Value::Bool(false));
        let mid = payload.len() / 2;
        let first = transfer(1, b"tag-2", true);
        let second = transfer(1, b"tag-2", false);

        let result = assembler
            .on_transfer(&first, payload.slice(0..mid), None, false)
            .unwrap();
        assert!(result.is_none());

        let result = assembler
            .on_transfer(&second, payload.slice(mid..), None, false)
            .unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn oversized_delivery_is_fatal_when_link_open() {
        let mut assembler = Assembler::new();
        let payload = encode_message(Value::String("x".repeat(64)));
        let transfer = transfer(2, b"tag-3", false);
        let err = assembler
            .on_transfer(&transfer, payload, Some(4), false)
            .unwrap_err();
        assert!(matches!(err, EngineError::MessageSizeExceeded { .. }));
    }

    #[test]
    fn oversized_delivery_is_discarded_silently_when_closing() {
        let mut assembler = Assembler::new();
        let payload = encode_message(Value::String("x".repeat(64)));
        let transfer = transfer(3, b"tag-4", false);
        let result = assembler
            .on_transfer(&transfer, payload, Some(4), true)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn assembled_delivery_echoes_the_transfer_frames_batchable_flag() {
        let mut assembler = Assembler::new();
        let payload = encode_message(Value::Bool(true));
        let transfer = transfer_with_batchable(4, b"tag-5", false, true);
        let (delivery, _) = assembler
            .on_transfer(&transfer, payload, None, false)
            .unwrap()
            .expect("should complete");
        assert!(delivery.batchable());
    }
}
