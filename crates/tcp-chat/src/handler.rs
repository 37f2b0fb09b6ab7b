//! Drives one client connection from greeting to disconnect.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use crate::protocol;
use crate::room::ChatRoom;
use crate::session::{self, Session};

/// How long a closing connection waits for its writer to drain before the
/// stream is dropped regardless.
pub const WRITER_LINGER: Duration = Duration::from_secs(2);

/// Lifecycle of a connection. Moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Greeting,
    Naming,
    Active,
    Closed,
}

/// Owns one accepted stream and runs it through
/// `Greeting -> Naming -> Active -> Closed`.
///
/// Any read failure (EOF included) ends the connection. Write failures while
/// greeting or naming do the same; once active, writes happen on the
/// session's writer task and a failure there only stops delivery.
pub struct ConnectionHandler<S> {
    stream: S,
    room: Arc<ChatRoom>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, room: Arc<ChatRoom>) -> Self {
        Self { stream, room }
    }

    /// Run the connection to completion. Always returns in `Closed`.
    pub async fn run(self) -> ConnectionState {
        let room = self.room;
        let mut state = ConnectionState::Greeting;
        let (read_half, write_half) = tokio::io::split(self.stream);
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);
        let mut buf = Vec::new();

        // ── Greeting ────────────────────────────────────────────────
        if let Err(error) = write_text(&mut writer, &protocol::greeting()).await {
            debug!(%error, "failed to send greeting");
            return enter(&mut state, ConnectionState::Closed);
        }

        // ── Naming ──────────────────────────────────────────────────
        enter(&mut state, ConnectionState::Naming);
        let name = match negotiate_name(&mut reader, &mut writer, &mut buf).await {
            Some(name) => name,
            None => {
                debug!("no usable name, dropping connection");
                return enter(&mut state, ConnectionState::Closed);
            }
        };

        // ── Active ──────────────────────────────────────────────────
        enter(&mut state, ConnectionState::Active);
        let (session, outbound) = Session::new(name.clone(), room.outbound_queue());
        let mut writer_task = session::spawn_writer(session.id(), name.clone(), writer, outbound);
        let membership = Membership::join(&room, Arc::clone(&session));

        loop {
            match protocol::read_line(&mut reader, &mut buf).await {
                Ok(Some(line)) => {
                    let text = line.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let message = protocol::chat_line_now(&name, text);
                    info!(session_id = %session.id(), "{message}");
                    room.publish(message);
                }
                Ok(None) => break,
                Err(error) => {
                    debug!(session_id = %session.id(), %error, "read failed");
                    break;
                }
            }
        }

        // ── Closed ──────────────────────────────────────────────────
        drop(membership);
        drop(session);
        // The room held the only other handle to the queue, so the writer
        // drains what is left and shuts the socket down. A peer that stopped
        // reading gets cut off after the linger period.
        if tokio::time::timeout(WRITER_LINGER, &mut writer_task).await.is_err() {
            warn!(%name, "writer did not drain in time, dropping connection");
            writer_task.abort();
        }
        enter(&mut state, ConnectionState::Closed)
    }
}

fn enter(state: &mut ConnectionState, next: ConnectionState) -> ConnectionState {
    let from = *state;
    debug!(?from, to = ?next, "connection state");
    *state = next;
    next
}

/// Read up to two candidate names. `None` means the client gave two blank
/// answers or went away.
///
/// A client that hangs up while naming is never registered: EOF closes at
/// once without a retry prompt, and a name with no line terminator is
/// discarded, so no join/leave pair is broadcast for it.
async fn negotiate_name<R, W>(reader: &mut R, writer: &mut W, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let first = read_trimmed(reader, buf).await?;
    if !first.is_empty() {
        return Some(first);
    }

    write_text(writer, protocol::NAME_RETRY_PROMPT).await.ok()?;
    let second = read_trimmed(reader, buf).await?;
    if second.is_empty() {
        None
    } else {
        Some(second)
    }
}

async fn read_trimmed<R>(reader: &mut R, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match protocol::read_line(reader, buf).await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        Ok(None) => None,
        Err(error) => {
            debug!(%error, "read failed while naming");
            None
        }
    }
}

async fn write_text<W>(writer: &mut W, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await
}

/// Registry membership for an active session. Joining happens on
/// construction; dropping it deregisters and announces the departure, even
/// if the handler unwinds.
struct Membership<'a> {
    room: &'a ChatRoom,
    session: Arc<Session>,
}

impl<'a> Membership<'a> {
    fn join(room: &'a ChatRoom, session: Arc<Session>) -> Self {
        info!(session_id = %session.id(), "{}", protocol::join_announcement(session.name()));
        room.join(&session);
        Self { room, session }
    }
}

impl Drop for Membership<'_> {
    fn drop(&mut self) {
        if self.room.leave(&self.session).is_some() {
            info!(
                session_id = %self.session.id(),
                "{}",
                protocol::leave_announcement(self.session.name())
            );
        }
    }
}
