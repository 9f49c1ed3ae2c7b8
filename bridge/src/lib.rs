// Library exports for testing and reuse

pub mod bus;
pub mod config;
pub mod context;
pub mod error;
pub mod listener;
pub mod logging;
pub mod processor;
pub mod response;
pub mod stats;

pub use bus::{BusError, BusPublisher, MqttBus};
pub use config::BridgeConfig;
pub use context::BridgeContext;
pub use listener::{shutdown, start_listener, ListenerHandle};
pub use processor::RequestProcessor;
