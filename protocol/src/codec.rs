//! Chunk-oriented JSON codec for the socket protocol.
//!
//! Every inbound read is one request unit. There is no reassembly across
//! chunks; a request split over two reads fails to decode.

use serde_json::Value;

use crate::message::{AckResult, RequestEnvelope};

/// Terminator appended to every encoded acknowledgment.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Largest chunk accepted by the default [`CodecLimits`].
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 64 * 1024;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Limits applied by [`LineCodec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecLimits {
    pub max_chunk_size: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Errors produced while decoding a request chunk.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("chunk exceeds limit: limit={limit} actual={actual}")]
    ChunkTooLarge { limit: usize, actual: usize },

    #[error("top-level JSON value is not an object")]
    NotAnObject,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default)]
pub struct LineCodec {
    limits: CodecLimits,
}

impl LineCodec {
    #[must_use]
    pub const fn new(limits: CodecLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn limits(&self) -> CodecLimits {
        self.limits
    }

    /// Decodes one raw chunk. Leading and trailing whitespace (including a
    /// byte order mark) is trimmed; invalid UTF-8 is replaced rather than
    /// rejected up front.
    pub fn decode_request(&self, chunk: &[u8]) -> Result<RequestEnvelope, CodecError> {
        if chunk.len() > self.limits.max_chunk_size {
            return Err(CodecError::ChunkTooLarge {
                limit: self.limits.max_chunk_size,
                actual: chunk.len(),
            });
        }

        let text = String::from_utf8_lossy(chunk);
        let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK);
        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(fields) => Ok(RequestEnvelope::new(fields)),
            _ => Err(CodecError::NotAnObject),
        }
    }

    /// Encodes an acknowledgment as a single newline-terminated JSON line.
    pub fn encode_ack(&self, ack: &AckResult) -> Result<Vec<u8>, CodecError> {
        let mut line = serde_json::to_vec(ack)?;
        line.push(LINE_TERMINATOR);
        Ok(line)
    }
}
