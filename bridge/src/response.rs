use protocol::{AckResult, LineCodec};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Writes one acknowledgment as a newline-terminated JSON line.
pub async fn write_ack<W>(writer: &mut W, codec: &LineCodec, ack: AckResult) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = codec.encode_ack(&ack)?;
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
