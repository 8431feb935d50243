//! Error kinds raised by the receive-side credit engine.

use fe2o3_amqp_types::definitions::{self, AmqpError};

/// Errors surfaced by [`crate::link::receiver::ReceiverEngine`] and its collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// The link is already closed or closing; the requested operation cannot proceed.
    #[error("link is closed")]
    LinkClosed,

    /// A transfer would push the assembled message past the link's negotiated
    /// `max-message-size`.
    #[error("message size {size} exceeds max-message-size {max}")]
    MessageSizeExceeded {
        /// The size the message would have reached.
        size: u64,
        /// The negotiated maximum.
        max: u64,
    },

    /// An operation was attempted while the engine or one of its collaborators was in a
    /// state that does not allow it (e.g. a non-terminal/non-outcome delivery state was
    /// returned for a disposition).
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A waiter or a disposition future exceeded its configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// A waiter or disposition future was cancelled before it completed, e.g. due to link
    /// abort.
    #[error("operation cancelled")]
    Cancelled,

    /// A disposition was requested for a delivery tag with no matching unsettled delivery.
    #[error("no unsettled delivery for the given tag")]
    NotFound,

    /// A message listener was already registered on this link.
    #[error("a message listener is already registered")]
    DuplicateListener,
}

impl From<EngineError> for definitions::Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::LinkClosed => {
                definitions::Error::new(AmqpError::IllegalState, Some(err.to_string()), None)
            }
            EngineError::MessageSizeExceeded { .. } => definitions::Error::new(
                definitions::LinkError::MessageSizeExceeded,
                Some(err.to_string()),
                None,
            ),
            EngineError::IllegalState(_) => {
                definitions::Error::new(AmqpError::IllegalState, Some(err.to_string()), None)
            }
            EngineError::Timeout => {
                definitions::Error::new(AmqpError::IllegalState, Some(err.to_string()), None)
            }
            EngineError::Cancelled => {
                definitions::Error::new(AmqpError::IllegalState, Some(err.to_string()), None)
            }
            EngineError::NotFound => {
                definitions::Error::new(AmqpError::NotFound, Some(err.to_string()), None)
            }
            EngineError::DuplicateListener => {
                definitions::Error::new(AmqpError::NotAllowed, Some(err.to_string()), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_size_exceeded_maps_to_link_error() {
        let err = EngineError::MessageSizeExceeded {
            size: 2048,
            max: 1024,
        };
        let amqp_err: definitions::Error = err.clone().into();
        let expected = definitions::Error::new(
            definitions::LinkError::MessageSizeExceeded,
            Some(err.to_string()),
            None,
        );
        assert_eq!(amqp_err, expected);
    }
}
