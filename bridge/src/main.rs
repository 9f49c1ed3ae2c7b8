use std::sync::Arc;

use anyhow::Context;

use bridge::bus::MqttBus;
use bridge::config::BridgeConfig;
use bridge::context::BridgeContext;
use bridge::listener::{shutdown, start_listener};
use bridge::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (for development)
    if dotenvy::dotenv().is_err() {
        dotenvy::from_filename("bridge/.env").ok();
    }

    let config = load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load bridge configuration: {}", e);
        std::process::exit(1);
    });

    logging::init(config.debug);
    log::info!(
        "Starting socket bridge (protocol {})",
        protocol::protocol_version()
    );
    if !config.mqtt.namespace.is_empty() {
        log::debug!("MQTT namespace '{}' is reserved and not applied", config.mqtt.namespace);
    }

    let bus = MqttBus::connect(&config.mqtt)
        .await
        .with_context(|| format!("failed to connect to MQTT broker at {}", config.mqtt_uri()))?;
    log::info!("Connected to MQTT: {}", bus.uri());

    let bind_addr = config.socket_addr();
    let ctx = BridgeContext::new(config, Arc::new(bus));

    log::info!("Starting to listen on tcp://{}", bind_addr);
    let listener = start_listener(ctx.clone())
        .await
        .context("failed to start socket listener")?;
    log::info!("Listening on tcp://{}", listener.local_addr());

    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to wait for shutdown signal: {}", err);
    }
    log::info!("Shutting down...");

    shutdown(listener, &ctx).await;

    log::info!("Final stats: {}", ctx.stats().snapshot());
    Ok(())
}

fn load_config() -> bridge::error::Result<BridgeConfig> {
    match std::env::var("CONFIG_PATH") {
        Ok(path) => BridgeConfig::load_from_file(path),
        Err(_) => BridgeConfig::from_env(),
    }
}
