//! Publish side of the bridge: the [`BusPublisher`] seam and its MQTT
//! implementation.

use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use rumqttc::{
    AsyncClient, ClientError, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet,
    QoS,
};
use protocol::DEFAULT_MAX_CHUNK_SIZE;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::MqttConfig;

const REQUEST_CHANNEL_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);
const MIN_KEEP_ALIVE: Duration = Duration::from_secs(5);

/// Largest MQTT packet the client sends or accepts. Any request the default
/// codec accepts fits, with room for the PUBLISH fixed and variable headers.
pub const MAX_PACKET_SIZE: usize = DEFAULT_MAX_CHUNK_SIZE + 1024;

// Topic length prefix in the PUBLISH variable header.
const TOPIC_LENGTH_PREFIX: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("broker refused connection: {0}")]
    Refused(String),

    #[error("broker connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("publish rejected by client: {0}")]
    Client(#[from] ClientError),

    #[error("publish topic is empty")]
    EmptyTopic,

    #[error("publish exceeds packet limit: limit={limit} actual={actual}")]
    PacketTooLarge { limit: usize, actual: usize },

    #[error("bus is closed")]
    Closed,
}

/// Minimal publish capability the request pipeline depends on.
///
/// Implementations must tolerate concurrent `publish` calls.
pub trait BusPublisher: Send + Sync {
    /// Hands `payload` to the bus for `topic`. Completion means the client
    /// accepted the message, not that the broker delivered it.
    fn publish(&self, topic: String, payload: String) -> BoxFuture<'_, Result<(), BusError>>;

    fn disconnect(&self) -> BoxFuture<'_, Result<(), BusError>>;
}

/// MQTT bus client. Publishes at QoS 0, not retained.
pub struct MqttBus {
    client: AsyncClient,
    uri: String,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl MqttBus {
    /// Connects and waits for the broker's CONNACK. Transport errors are
    /// retried indefinitely; a refused connection is returned as an error.
    pub async fn connect(config: &MqttConfig) -> Result<Self, BusError> {
        let client_id = config.client_id.clone().unwrap_or_else(generate_client_id);
        let uri = config.uri();

        let mut options = MqttOptions::new(client_id.clone(), config.hostname.clone(), config.port);
        let keep_alive = Duration::from_secs(u64::from(config.keep_alive_secs));
        options
            .set_keep_alive(keep_alive.max(MIN_KEEP_ALIVE))
            .set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        log::info!("Connecting to MQTT: {} (client id {})", uri, client_id);
        wait_for_connack(&mut eventloop, &uri).await?;

        let driver = tokio::spawn(drive_event_loop(eventloop, uri.clone()));

        Ok(Self {
            client,
            uri,
            driver: Mutex::new(Some(driver)),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl BusPublisher for MqttBus {
    fn publish(&self, topic: String, payload: String) -> BoxFuture<'_, Result<(), BusError>> {
        async move {
            check_publish(&topic, &payload)?;
            self.client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), BusError>> {
        async move {
            self.client.disconnect().await?;

            let driver = self.driver.lock().ok().and_then(|mut slot| slot.take());
            if let Some(mut driver) = driver {
                if tokio::time::timeout(DISCONNECT_GRACE, &mut driver)
                    .await
                    .is_err()
                {
                    log::warn!("MQTT event loop did not stop in time; aborting it");
                    driver.abort();
                }
            }

            Ok(())
        }
        .boxed()
    }
}

/// Rejects publishes the broker could never route: an empty topic, or a
/// packet larger than [`MAX_PACKET_SIZE`].
fn check_publish(topic: &str, payload: &str) -> Result<(), BusError> {
    if topic.is_empty() {
        return Err(BusError::EmptyTopic);
    }

    let actual = TOPIC_LENGTH_PREFIX + topic.len() + payload.len();
    if actual > MAX_PACKET_SIZE {
        return Err(BusError::PacketTooLarge {
            limit: MAX_PACKET_SIZE,
            actual,
        });
    }

    Ok(())
}

fn generate_client_id() -> String {
    format!("socket-bridge-{}", Uuid::new_v4().simple())
}

async fn wait_for_connack(eventloop: &mut EventLoop, uri: &str) -> Result<(), BusError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
            Ok(_) => {}
            Err(ConnectionError::ConnectionRefused(code)) => {
                return Err(BusError::Refused(format!("{:?}", code)));
            }
            Err(err) => {
                log::warn!("Waiting for MQTT broker at {}: {}", uri, err);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

async fn drive_event_loop(mut eventloop: EventLoop, uri: String) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("Reconnected to MQTT: {}", uri);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                log::info!("Disconnected from MQTT: {}", uri);
                break;
            }
            Ok(_) => {}
            Err(err) => {
                log::warn!("MQTT connection error ({}): {}", uri, err);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
