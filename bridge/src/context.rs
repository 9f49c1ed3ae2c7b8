use std::sync::Arc;

use protocol::LineCodec;

use crate::bus::BusPublisher;
use crate::config::BridgeConfig;
use crate::stats::BridgeStats;

/// Everything the connection handler and request processor need, built once
/// at startup after the bus is connected.
#[derive(Clone)]
pub struct BridgeContext {
    config: Arc<BridgeConfig>,
    bus: Arc<dyn BusPublisher>,
    stats: Arc<BridgeStats>,
    codec: LineCodec,
}

impl BridgeContext {
    pub fn new(config: BridgeConfig, bus: Arc<dyn BusPublisher>) -> Self {
        Self {
            config: Arc::new(config),
            bus,
            stats: Arc::new(BridgeStats::new()),
            codec: LineCodec::default(),
        }
    }

    #[must_use]
    pub fn with_codec(mut self, codec: LineCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<dyn BusPublisher> {
        &self.bus
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    pub fn codec(&self) -> &LineCodec {
        &self.codec
    }
}
