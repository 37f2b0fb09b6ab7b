//! Wire text of the chat protocol and inbound line framing.
//!
//! Everything a client sees is produced here: the greeting, the name prompts,
//! join/leave announcements and timestamped chat lines.

use std::io;

use chrono::{DateTime, Local};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

// ── Greeting and prompts ────────────────────────────────────────────

pub const WELCOME: &str = "Welcome to TCP-Chat!\n";

pub const LOGO: &str = r#"
         _nnnn_
        dGGGGMMb
       @p~qp~~qMb
       M|@||@) M|
       @,----.JM|
      JS^\__/  qKL
     dZP        qKRb
    dZP          qKKb
   fZP            SMMb
   HZM            MMMM
   FqM            MMMM
 __| ".        |\\dS"qML
 |    '.       |  \\' Zq
_)      \\.___.,|     .'
\\____   )MMMMMP|   .'
     '-'       '--'"#;

pub const NAME_PROMPT: &str = "\n[ENTER YOUR NAME]: ";

pub const NAME_RETRY_PROMPT: &str = "\n[ENTER CORRECT YOUR NAME]: ";

/// Full greeting sent to a fresh connection, ending with the name prompt.
pub fn greeting() -> String {
    let mut text = String::with_capacity(WELCOME.len() + LOGO.len() + NAME_PROMPT.len());
    text.push_str(WELCOME);
    text.push_str(LOGO);
    text.push_str(NAME_PROMPT);
    text
}

// ── Broadcast lines ─────────────────────────────────────────────────

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn join_announcement(name: &str) -> String {
    format!("{name} has joined our chat...")
}

pub fn leave_announcement(name: &str) -> String {
    format!("{name} has left our chat...")
}

/// `[YYYY-MM-DD HH:MM:SS][name]: text`
pub fn chat_line(at: &DateTime<Local>, name: &str, text: &str) -> String {
    format!("[{}][{}]: {}", at.format(TIMESTAMP_FORMAT), name, text)
}

/// Chat line stamped with the current local time.
pub fn chat_line_now(name: &str, text: &str) -> String {
    chat_line(&Local::now(), name, text)
}

/// Appends the line terminator used on the wire.
pub fn terminate(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 1);
    out.push_str(line);
    out.push('\n');
    out
}

// ── Inbound framing ─────────────────────────────────────────────────

/// Longest inbound line accepted, terminator included.
pub const MAX_LINE: usize = 64 * 1024;

/// Read one `\n`-terminated line.
///
/// Returns `Ok(None)` at end of stream. A trailing fragment with no
/// terminator is dropped: the peer hung up mid-line. Invalid UTF-8 is
/// replaced rather than rejected. The returned line keeps surrounding
/// whitespace; callers trim. A line longer than [`MAX_LINE`] is an
/// `InvalidData` error.
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader).take(MAX_LINE as u64).read_until(b'\n', buf).await?;
    if buf.last() != Some(&b'\n') {
        if n == MAX_LINE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "line too long"));
        }
        return Ok(None);
    }
    buf.pop();
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}
