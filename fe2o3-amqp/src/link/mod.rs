//! Receive-side credit engine for an AMQP 1.0 link.
//!
//! The five collaborating pieces are:
//!
//! - [`flow_queue`] — the prefetch buffer and its size-based credit math.
//! - [`waiter`] — the FIFO list of pending `begin_receive` calls.
//! - [`disposition`] — the registry of in-flight disposition updates.
//! - [`assembler`] — multi-frame transfer reassembly.
//! - [`receiver`] — [`receiver::ReceiverEngine`], the coordinator that ties the above
//!   together behind a single lock.
//! - [`builder`] — [`builder::ReceiverEngineBuilder`], a fluent way to assemble the
//!   [`external::EngineSettings`] a host link implementation hands the engine.

use fe2o3_amqp_types::definitions::SequenceNo;

pub mod assembler;
pub mod builder;
pub mod delivery;
pub mod disposition;
pub mod error;
pub mod external;
pub mod flow_queue;
pub mod receiver;
pub mod waiter;

pub use error::EngineError;
pub use receiver::ReceiverEngine;

/// Default amount of link credit issued when auto-credit is enabled and no prior credit
/// has been established.
pub const DEFAULT_CREDIT: SequenceNo = 200;

/// Ceiling on the credit a single size-based flow update may request, regardless of how
/// large the configured cache budget is.
pub const MAX_CREDIT_PER_FLOW: u32 = 500;

/// Assumed average serialized message size until at least one message has actually been
/// observed on the link.
pub const DEFAULT_AVG_MSG_SIZE: u64 = 256 * 1024;

/// Ceiling on the on-demand credit the engine will request on behalf of waiters when
/// auto-credit is disabled.
pub const MAX_ON_DEMAND_CREDIT: u32 = 200;

/// Waiter-count threshold below which on-demand credit is issued eagerly in the
/// singleton regime (every waiter requests exactly one message).
pub const BATCH_THRESHOLD: u32 = 20;

/// Waiter-count threshold below which on-demand credit is issued eagerly in the
/// multi regime (at least one waiter requests more than one message).
pub const PENDING_THRESHOLD: u32 = 20;
