//! Per-connection session state and its outbound writer task.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::protocol;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique session identifier. Registry membership is keyed on this,
/// never on the display name, since names may repeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

/// Why a chunk could not be queued for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbound queue full")]
    QueueFull,
    #[error("outbound writer closed")]
    Closed,
}

/// A named, connected client.
///
/// The connection handler owns the `Arc` for the session's whole life; the
/// registry only holds clones while the session is active. Outbound text goes
/// through a bounded queue drained by [`spawn_writer`].
pub struct Session {
    id: SessionId,
    name: String,
    outbound: mpsc::Sender<String>,
}

impl Session {
    /// Create a session and the receiving end of its outbound queue.
    pub fn new(name: impl Into<String>, queue_capacity: usize) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let session = Arc::new(Self {
            id: SessionId::next(),
            name: name.into(),
            outbound: tx,
        });
        (session, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue one line; the terminator is added here. Never waits.
    pub fn send_line(&self, line: &str) -> Result<(), DeliveryError> {
        self.send_chunk(protocol::terminate(line))
    }

    /// Queue several lines as a single chunk, so they reach the writer
    /// together and cannot be interleaved with later broadcasts.
    pub fn send_lines<'a, I>(&self, lines: I) -> Result<(), DeliveryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut chunk = String::new();
        for line in lines {
            chunk.push_str(line);
            chunk.push('\n');
        }
        if chunk.is_empty() {
            return Ok(());
        }
        self.send_chunk(chunk)
    }

    fn send_chunk(&self, chunk: String) -> Result<(), DeliveryError> {
        self.outbound.try_send(chunk).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Drain a session's outbound queue into `writer`, flushing after every
/// chunk. Stops at the first write or flush error, or once every sender is
/// dropped, then shuts the writer down.
pub fn spawn_writer<W>(
    id: SessionId,
    name: String,
    mut writer: W,
    mut rx: mpsc::Receiver<String>,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            if let Err(error) = writer.write_all(chunk.as_bytes()).await {
                warn!(session_id = %id, name = %name, %error, "error writing to client");
                break;
            }
            if let Err(error) = writer.flush().await {
                warn!(session_id = %id, name = %name, %error, "error flushing client");
                break;
            }
        }
        rx.close();
        let _ = writer.shutdown().await;
        debug!(session_id = %id, name = %name, "writer stopped");
    })
}
