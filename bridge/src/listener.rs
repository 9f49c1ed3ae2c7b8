use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::context::BridgeContext;
use crate::error::{BridgeError, Result};
use crate::processor::RequestProcessor;
use crate::response;

pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections. Open connections are left to their
    /// callers.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Waits for the accept loop to exit.
    pub async fn closed(self) {
        if let Err(err) = self.task.await {
            log::error!("Accept loop ended abnormally: {}", err);
        }
    }
}

/// Stops the listener, then disconnects the bus.
pub async fn shutdown(listener: ListenerHandle, ctx: &BridgeContext) {
    listener.close();
    listener.closed().await;

    if let Err(err) = ctx.bus().disconnect().await {
        log::error!("Bus disconnect failed: {}", err);
    }
}

/// Binds the configured address and starts accepting connections.
pub async fn start_listener(ctx: BridgeContext) -> Result<ListenerHandle> {
    let bind_addr = ctx.config().socket_addr();
    let host = ctx.config().socket.host.clone();
    let port = ctx.config().socket.port;

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|source| BridgeError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let limit = match ctx.config().socket.max_connections {
        0 => None,
        max => Some(Arc::new(Semaphore::new(max))),
    };

    let shutdown = Arc::new(Notify::new());
    let processor = Arc::new(RequestProcessor::new(ctx));
    let task = tokio::spawn(accept_loop(listener, processor, shutdown.clone(), limit));

    Ok(ListenerHandle {
        local_addr,
        shutdown,
        task,
    })
}

async fn accept_loop(
    listener: TcpListener,
    processor: Arc<RequestProcessor>,
    shutdown: Arc<Notify>,
    limit: Option<Arc<Semaphore>>,
) {
    loop {
        let permit = match &limit {
            Some(semaphore) => tokio::select! {
                _ = shutdown.notified() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_) => break,
                },
            },
            None => None,
        };

        tokio::select! {
            _ = shutdown.notified() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    processor.context().stats().record_connection();
                    tokio::spawn(handle_connection(stream, peer, processor.clone(), permit));
                }
                Err(err) => {
                    log::warn!("Failed to accept connection: {}", err);
                }
            },
        }
    }

    if let Ok(addr) = listener.local_addr() {
        log::info!("Stopped listening on tcp://{}", addr);
    }
}

/// Serves one connection. Each read is one request; acknowledgments are
/// written in arrival order and the connection stays open until the peer
/// closes it.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    processor: Arc<RequestProcessor>,
    _permit: Option<OwnedSemaphorePermit>,
) {
    log::debug!("Connection opened from {}", peer);

    let codec = processor.context().codec().clone();
    let mut buf = vec![0u8; codec.limits().max_chunk_size];

    loop {
        let read = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) => {
                log::debug!("Read from {} failed: {}", peer, err);
                break;
            }
        };

        let ack = processor.process(&buf[..read], peer).await;

        if let Err(err) = response::write_ack(&mut stream, &codec, ack).await {
            log::debug!("Write to {} failed: {}", peer, err);
            break;
        }
    }

    log::debug!("Connection closed from {}", peer);
}
