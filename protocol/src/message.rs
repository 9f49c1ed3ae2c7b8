//! Request and acknowledgment types for the line-oriented JSON socket protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying the shared secret.
pub const SECRET_FIELD: &str = "secret";
/// Field carrying the destination topic.
pub const TOPIC_FIELD: &str = "topic";
/// Field carrying the message payload.
pub const MESSAGE_FIELD: &str = "message";

/// Acknowledgment written back to the caller for every request.
///
/// Serializes to exactly `{"success":true}` or `{"success":false}`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResult {
    pub success: bool,
}

impl AckResult {
    pub const ACCEPTED: Self = Self { success: true };
    pub const REJECTED: Self = Self { success: false };

    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        Self { success }
    }
}

/// A decoded request: any JSON object. Field presence is not checked at
/// decode time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestEnvelope {
    fields: Map<String, Value>,
}

impl RequestEnvelope {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The `secret` field, if it is present and a string.
    pub fn secret(&self) -> Option<&str> {
        self.str_field(SECRET_FIELD)
    }

    /// The `topic` field, if it is present and a string.
    pub fn topic(&self) -> Option<&str> {
        self.str_field(TOPIC_FIELD)
    }

    /// The `message` field, if it is present and a string.
    pub fn message(&self) -> Option<&str> {
        self.str_field(MESSAGE_FIELD)
    }

    /// Exact string comparison against the configured shared secret.
    pub fn secret_matches(&self, expected: &str) -> bool {
        self.secret() == Some(expected)
    }

    /// Removes the secret so the request can be logged.
    pub fn strip_secret(&mut self) {
        self.fields.remove(SECRET_FIELD);
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Compact JSON rendering of the (possibly stripped) request.
    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// A request that passed every validation step and is ready to be forwarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishRequest {
    pub topic: String,
    pub message: String,
}

/// Why a request was refused. The display text is what ends up in the
/// server log; the caller only ever sees `{"success":false}`.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    #[error("Invalid JSON")]
    MalformedRequest,

    #[error("Incorrect secret")]
    Unauthorized,

    #[error("Missing topic in JSON")]
    MissingTopic,

    #[error("Missing message in JSON")]
    MissingMessage,

    #[error("Publish failed")]
    PublishFailed,
}

impl RejectReason {
    pub const COUNT: usize = 5;

    pub const ALL: [RejectReason; Self::COUNT] = [
        RejectReason::MalformedRequest,
        RejectReason::Unauthorized,
        RejectReason::MissingTopic,
        RejectReason::MissingMessage,
        RejectReason::PublishFailed,
    ];

    /// Stable position of this reason inside [`RejectReason::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            RejectReason::MalformedRequest => 0,
            RejectReason::Unauthorized => 1,
            RejectReason::MissingTopic => 2,
            RejectReason::MissingMessage => 3,
            RejectReason::PublishFailed => 4,
        }
    }
}
