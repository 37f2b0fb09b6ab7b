use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, info_span, warn, Instrument};

use crate::config::ServerConfig;
use crate::error::{ChatError, Result};
use crate::handler::ConnectionHandler;
use crate::room::ChatRoom;

/// Bound listener plus the room every accepted connection joins.
pub struct ChatServer {
    listener: TcpListener,
    room: Arc<ChatRoom>,
}

impl ChatServer {
    /// Bind the listening socket. This is the only fatal failure point.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = config.listen_addr();
        let bound = TcpListener::bind(&addr).await;
        let listener = bound.map_err(|source| ChatError::Bind { addr, source })?;
        Ok(Self {
            listener,
            room: Arc::new(ChatRoom::new(config.outbound_queue)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn room(&self) -> Arc<ChatRoom> {
        Arc::clone(&self.room)
    }

    /// Accept connections until `shutdown` resolves, one task per client.
    /// Connections already accepted keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "listening on the port: {}", addr.port());
        }
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let handler = ConnectionHandler::new(stream, Arc::clone(&self.room));
                            let span = info_span!("connection", %peer);
                            tokio::spawn(async move {
                                handler.run().await;
                            }.instrument(span));
                        }
                        Err(error) => {
                            warn!(%error, "accept error");
                            continue;
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("stopped accepting connections");
                    break;
                }
            }
        }
    }
}
