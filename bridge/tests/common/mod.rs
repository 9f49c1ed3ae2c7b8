#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bridge::bus::{BusError, BusPublisher};
use bridge::config::BridgeConfig;
use bridge::context::BridgeContext;
use futures_util::future::{BoxFuture, FutureExt};

pub const SECRET: &str = "s";

/// In-memory bus that records every publish.
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
    disconnected: AtomicBool,
}

impl RecordingBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let bus = Self::default();
        bus.failing.store(true, Ordering::SeqCst);
        Arc::new(bus)
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

impl BusPublisher for RecordingBus {
    fn publish(&self, topic: String, payload: String) -> BoxFuture<'_, Result<(), BusError>> {
        async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(BusError::Closed);
            }
            self.published.lock().unwrap().push((topic, payload));
            Ok(())
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), BusError>> {
        async move {
            self.disconnected.store(true, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}

pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.socket.host = "127.0.0.1".to_string();
    config.socket.port = 0;
    config.socket.secret = SECRET.to_string();
    config
}

pub fn context_with(bus: Arc<RecordingBus>) -> BridgeContext {
    BridgeContext::new(test_config(), bus)
}
