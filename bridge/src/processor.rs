//! Turns one inbound chunk into exactly one acknowledgment.

use std::net::SocketAddr;

use protocol::{AckResult, PublishRequest, RejectReason, RequestEnvelope};

use crate::context::BridgeContext;

pub struct RequestProcessor {
    ctx: BridgeContext,
}

impl RequestProcessor {
    pub fn new(ctx: BridgeContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    /// Validates a chunk. Checks run in a fixed order and the first failure
    /// wins: JSON object, secret, topic, message.
    pub fn validate(
        &self,
        chunk: &[u8],
    ) -> Result<(RequestEnvelope, PublishRequest), RejectReason> {
        let request = self.ctx.codec().decode_request(chunk).map_err(|err| {
            log::debug!("Request decode failed: {}", err);
            RejectReason::MalformedRequest
        })?;

        if !request.secret_matches(&self.ctx.config().socket.secret) {
            return Err(RejectReason::Unauthorized);
        }

        let topic = request.topic().ok_or(RejectReason::MissingTopic)?;
        let message = request.message().ok_or(RejectReason::MissingMessage)?;

        let publish = PublishRequest {
            topic: topic.to_string(),
            message: message.to_string(),
        };

        Ok((request, publish))
    }

    /// Validates, forwards to the bus and builds the acknowledgment. Never
    /// fails; every problem becomes `{"success":false}`.
    pub async fn process(&self, chunk: &[u8], peer: SocketAddr) -> AckResult {
        let (mut request, publish) = match self.validate(chunk) {
            Ok(valid) => valid,
            Err(reason) => return self.failure(peer, reason),
        };

        if let Err(err) = self
            .ctx
            .bus()
            .publish(publish.topic, publish.message)
            .await
        {
            log::info!(
                "Failure from {}: {} ({})",
                peer.ip(),
                RejectReason::PublishFailed,
                err
            );
            self.ctx.stats().record_rejected(RejectReason::PublishFailed);
            return AckResult::REJECTED;
        }

        request.strip_secret();
        log::info!("Success: {}", request.to_json());
        self.ctx.stats().record_forwarded();

        AckResult::ACCEPTED
    }

    fn failure(&self, peer: SocketAddr, reason: RejectReason) -> AckResult {
        log::info!("Failure from {}: {}", peer.ip(), reason);
        self.ctx.stats().record_rejected(reason);
        AckResult::REJECTED
    }
}
