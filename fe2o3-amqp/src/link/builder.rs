//! A typestate-free builder for [`EngineSettings`].
//!
//! Unlike `fe2o3-amqp::link::builder::Builder` in the wider workspace (which drives an
//! attach handshake and so leans on typestates to forbid an incomplete attach), the
//! settings consumed by [`crate::link::receiver::ReceiverEngine`] have no such ordering
//! constraint — every field has a sensible default, so a plain fluent builder is enough.
//! Host link implementations are expected to build an [`EngineSettings`] once at attach
//! time and hand it to the engine alongside their [`ReceiverLinkExternal`] impl.

use super::external::{EngineSettings, SettleType};
use super::external::ReceiverLinkExternal;

/// Builds an [`EngineSettings`] value field by field, defaulting anything left unset.
#[derive(Debug, Clone, Default)]
pub struct ReceiverEngineBuilder {
    settings: EngineSettings,
}

impl ReceiverEngineBuilder {
    /// Starts from [`EngineSettings::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the engine manages credit automatically (count-based).
    pub fn auto_send_flow(mut self, auto_send_flow: bool) -> Self {
        self.settings.auto_send_flow = auto_send_flow;
        self
    }

    /// Sets the settlement policy for this link.
    pub fn settle_type(mut self, settle_type: SettleType) -> Self {
        self.settings.settle_type = settle_type;
        self
    }

    /// Sets the negotiated `max-message-size`. Pass `None` for unbounded.
    pub fn max_message_size(mut self, max_message_size: impl Into<Option<u64>>) -> Self {
        self.settings.max_message_size = max_message_size.into();
        self
    }

    /// Sets the byte budget for size-based prefetch. Pass `None` to use count-based
    /// credit instead.
    pub fn total_cache_size_in_bytes(mut self, bytes: impl Into<Option<u64>>) -> Self {
        self.settings.total_cache_size_in_bytes = bytes.into();
        self
    }

    /// Sets the starting total link credit to advertise on open.
    pub fn total_link_credit(mut self, credit: u32) -> Self {
        self.settings.total_link_credit = credit;
        self
    }

    /// Overrides the ceiling on credit a single size-based flow update may request.
    pub fn max_credit_per_flow(mut self, max: u32) -> Self {
        self.settings.max_credit_per_flow = max;
        self
    }

    /// Overrides the ceiling on on-demand credit issued when auto-credit is off.
    pub fn max_on_demand_credit(mut self, max: u32) -> Self {
        self.settings.max_on_demand_credit = max;
        self
    }

    /// Overrides the waiter-count threshold used in the singleton on-demand regime.
    pub fn batch_threshold(mut self, threshold: u32) -> Self {
        self.settings.batch_threshold = threshold;
        self
    }

    /// Overrides the waiter-count threshold used in the multi on-demand regime.
    pub fn pending_threshold(mut self, threshold: u32) -> Self {
        self.settings.pending_threshold = threshold;
        self
    }

    /// Finishes the builder, producing the settings a [`ReceiverLinkExternal`]
    /// implementation hands back from [`ReceiverLinkExternal::settings`].
    pub fn build(self) -> EngineSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_settings_default() {
        let built = ReceiverEngineBuilder::new().build();
        let default = EngineSettings::default();
        assert_eq!(built.auto_send_flow, default.auto_send_flow);
        assert_eq!(built.total_link_credit, default.total_link_credit);
    }

    #[test]
    fn overrides_every_tuning_constant() {
        let built = ReceiverEngineBuilder::new()
            .auto_send_flow(false)
            .settle_type(SettleType::SettleOnSend)
            .max_message_size(Some(4096))
            .total_cache_size_in_bytes(Some(1024 * 1024))
            .total_link_credit(50)
            .max_credit_per_flow(10)
            .max_on_demand_credit(10)
            .batch_threshold(2)
            .pending_threshold(2)
            .build();

        assert!(!built.auto_send_flow);
        assert_eq!(built.settle_type, SettleType::SettleOnSend);
        assert_eq!(built.max_message_size, Some(4096));
        assert_eq!(built.total_cache_size_in_bytes, Some(1024 * 1024));
        assert_eq!(built.total_link_credit, 50);
        assert_eq!(built.max_credit_per_flow, 10);
        assert_eq!(built.max_on_demand_credit, 10);
        assert_eq!(built.batch_threshold, 2);
        assert_eq!(built.pending_threshold, 2);
    }
}
