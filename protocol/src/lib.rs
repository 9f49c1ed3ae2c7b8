//! Wire types shared by the socket bridge and its clients.
//!
//! Requests are single JSON objects, one per socket read. Responses are a
//! single newline-terminated JSON object carrying only `success`.

pub mod codec;
pub mod message;

pub use codec::{CodecError, CodecLimits, DEFAULT_MAX_CHUNK_SIZE, LINE_TERMINATOR, LineCodec};
pub use message::{
    AckResult, MESSAGE_FIELD, PublishRequest, RejectReason, RequestEnvelope, SECRET_FIELD,
    TOPIC_FIELD,
};

/// Returns the protocol crate version string.
pub fn protocol_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
