#![deny(missing_debug_implementations)]

//! A standalone, in-memory receive-side credit engine for an AMQP 1.0 link.
//!
//! This crate implements the part of a receiver link that governs flow control:
//! reassembling inbound transfer frames into messages, dispatching them to waiting
//! consumers, tracking disposition, and deciding when to issue more link credit. It
//! does not speak the wire protocol, open connections, or perform the attach/detach
//! handshake — those are expected to be provided by a host link/session implementation
//! through the [`link::external::ReceiverLinkExternal`] trait.
//!
//! # Feature flags
//!
//! default: `[]`
//!
//! - `"tracing"`: emit diagnostic events via the `tracing` crate.
//! - `"log"`: emit diagnostic events via the `log` crate.
//!
//! At most one of the two is typically enabled by a binary crate; the library itself
//! compiles fine with neither.

pub mod link;

pub use link::{
    builder::ReceiverEngineBuilder,
    delivery::Delivery,
    error::EngineError,
    external::{EngineSettings, ReceiverLinkExternal, SettleType},
    receiver::{MessageListener, ReceiveOutcome, ReceiverEngine},
};

/// The payload buffer type shared between the frame-decoding path and assembled messages.
pub type Payload = bytes::Bytes;
