mod common;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Mutex, Once};

use bridge::context::BridgeContext;
use bridge::processor::RequestProcessor;
use common::{test_config, RecordingBus};
use log::{Level, LevelFilter, Log, Metadata, Record};
use protocol::AckResult;
use serial_test::serial;

const SECRET: &str = "topsecret-42";

static LINES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

/// Keeps every record logged by the bridge crate.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("bridge")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            LINES
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

fn start_capture() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    LINES.lock().unwrap().clear();
}

fn info_lines() -> Vec<String> {
    LINES
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level <= Level::Info)
        .map(|(_, line)| line.clone())
        .collect()
}

fn peer() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)), 50_123)
}

fn processor_with(bus: std::sync::Arc<RecordingBus>) -> RequestProcessor {
    let mut config = test_config();
    config.socket.secret = SECRET.to_string();
    RequestProcessor::new(BridgeContext::new(config, bus))
}

#[tokio::test]
#[serial]
async fn success_line_omits_the_secret() {
    start_capture();
    let processor = processor_with(RecordingBus::new());

    let chunk = format!(r#"{{"secret":"{SECRET}","topic":"/a/b","message":"hi"}}"#);
    assert_eq!(
        processor.process(chunk.as_bytes(), peer()).await,
        AckResult::ACCEPTED
    );

    let lines = info_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].starts_with("Success: "));
    assert!(lines[0].contains("\"topic\":\"/a/b\""));
    assert!(lines[0].contains("\"message\":\"hi\""));
    assert!(!lines[0].contains(SECRET));
    assert!(!lines[0].contains("\"secret\""));
}

#[tokio::test]
#[serial]
async fn rejection_line_names_peer_and_reason() {
    start_capture();
    let processor = processor_with(RecordingBus::new());

    let ack = processor
        .process(br#"{"secret":"wrong","topic":"/a/b","message":"hi"}"#, peer())
        .await;
    assert_eq!(ack, AckResult::REJECTED);

    assert_eq!(info_lines(), vec!["Failure from 10.0.0.7: Incorrect secret"]);
}

#[tokio::test]
#[serial]
async fn publish_failure_logs_a_single_line() {
    start_capture();
    let processor = processor_with(RecordingBus::failing());

    let chunk = format!(r#"{{"secret":"{SECRET}","topic":"/a/b","message":"hi"}}"#);
    assert_eq!(
        processor.process(chunk.as_bytes(), peer()).await,
        AckResult::REJECTED
    );

    let lines = info_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].starts_with("Failure from 10.0.0.7: Publish failed"));
    assert!(lines[0].contains("bus is closed"));
    assert!(!lines[0].contains(SECRET));
}
