//! The external collaborator surface (§6): everything this crate expects the host
//! link/session implementation to provide — frame I/O, attach/detach, and the link's own
//! negotiated settings.

use async_trait::async_trait;
use bytes::Bytes;
use fe2o3_amqp_types::{
    definitions::{self, DeliveryTag},
    messaging::DeliveryState,
};

/// How a delivery should be settled once this engine has decided its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleType {
    /// The receiver settles every delivery as soon as it arrives.
    SettleOnSend,
    /// The receiver settles only once it has decided an outcome (accept/reject/etc).
    SettleOnDisposition,
}

/// The negotiated, effectively-immutable settings of the link this engine is attached to.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Whether the engine manages credit automatically (count-based) or leaves it to
    /// on-demand computation driven by waiter arrivals.
    pub auto_send_flow: bool,
    /// Settlement policy for this link.
    pub settle_type: SettleType,
    /// Negotiated `max-message-size`; `None`/`0` means unbounded.
    pub max_message_size: Option<u64>,
    /// Byte budget for size-based prefetch; `None` selects count-based credit instead.
    pub total_cache_size_in_bytes: Option<u64>,
    /// Starting total link credit to advertise on open.
    pub total_link_credit: u32,
    /// Ceiling on the credit a single size-based flow update may request (see
    /// [`crate::link::flow_queue::FlowQueue`]). Defaults to [`super::MAX_CREDIT_PER_FLOW`].
    pub max_credit_per_flow: u32,
    /// Ceiling on the on-demand credit issued on behalf of waiters when `auto_send_flow`
    /// is off. Defaults to [`super::MAX_ON_DEMAND_CREDIT`].
    pub max_on_demand_credit: u32,
    /// Waiter-count threshold for eager on-demand issuance in the singleton regime.
    /// Defaults to [`super::BATCH_THRESHOLD`].
    pub batch_threshold: u32,
    /// Waiter-count threshold for eager on-demand issuance in the multi regime. Defaults
    /// to [`super::PENDING_THRESHOLD`].
    pub pending_threshold: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            auto_send_flow: true,
            settle_type: SettleType::SettleOnDisposition,
            max_message_size: None,
            total_cache_size_in_bytes: None,
            total_link_credit: super::DEFAULT_CREDIT,
            max_credit_per_flow: super::MAX_CREDIT_PER_FLOW,
            max_on_demand_credit: super::MAX_ON_DEMAND_CREDIT,
            batch_threshold: super::BATCH_THRESHOLD,
            pending_threshold: super::PENDING_THRESHOLD,
        }
    }
}

/// The host link/session operations this engine relies on to actually move bytes and
/// track attach-level state.
///
/// Implementations must not block or re-enter the engine from within these calls; the
/// coordinator always invokes them with its internal lock released (see
/// [`crate::link::receiver`]'s concurrency notes).
#[async_trait]
pub trait ReceiverLinkExternal: Send + Sync {
    /// Issues an absolute total credit to the peer via a flow frame.
    async fn issue_credit(&self, credit: u32, drain: bool, txn_id: Option<Bytes>);

    /// Emits a flow frame reflecting current state, optionally requesting an echo.
    async fn send_flow(&self, echo: bool);

    /// Updates the link's session-visible credit ceiling.
    async fn set_total_link_credit(
        &self,
        credit: u32,
        update_queue: bool,
        set_auto_flow: Option<bool>,
    );

    /// Sends a disposition for `tag`. Returns `false` if the tag does not correspond to a
    /// known unsettled delivery.
    async fn dispose_delivery(
        &self,
        tag: &DeliveryTag,
        settled: bool,
        state: DeliveryState,
        batchable: bool,
    ) -> bool;

    /// The link's terminal exception, if the link has already failed.
    fn terminal_exception(&self) -> Option<definitions::Error>;

    /// Whether the link is in the process of closing or aborting.
    fn is_closing(&self) -> bool;

    /// The link's currently advertised credit.
    fn link_credit(&self) -> u32;

    /// The link's negotiated settings.
    fn settings(&self) -> &EngineSettings;
}
