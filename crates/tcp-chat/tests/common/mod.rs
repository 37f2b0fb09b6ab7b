//! Reusable test harness for tcp-chat integration tests.
//!
//! Provides helpers for spawning the binary on a free port and talking to it
//! over plain TCP with line-level read helpers.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

pub const NAME_PROMPT: &str = "\n[ENTER YOUR NAME]: ";
pub const NAME_RETRY_PROMPT: &str = "\n[ENTER CORRECT YOUR NAME]: ";

// ── ServerHandle ────────────────────────────────────────────────────

/// Handle to a running tcp-chat process. Kills it on drop.
pub struct ServerHandle {
    pub child: Child,
    pub port: u16,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl ServerHandle {
    pub fn connect(&self) -> io::Result<ChatClient> {
        let stream = TcpStream::connect(("127.0.0.1", self.port))?;
        Ok(ChatClient::new(stream))
    }

    /// Connect and complete naming; returns once the client has seen its own
    /// join announcement.
    pub fn join(&self, name: &str) -> ChatClient {
        let mut client = self.connect().expect("failed to connect");
        client
            .read_until(NAME_PROMPT, Duration::from_secs(5))
            .expect("no name prompt");
        client.send_line(name).expect("failed to send name");
        client
            .read_until(&format!("{name} has joined our chat...\n"), Duration::from_secs(5))
            .expect("no join announcement");
        client
    }
}

// ── ChatClient ──────────────────────────────────────────────────────

/// Client wrapper for a connected TCP stream with text-level read/write.
pub struct ChatClient {
    stream: TcpStream,
    received: String,
}

impl ChatClient {
    pub fn new(stream: TcpStream) -> Self {
        stream.set_read_timeout(Some(Duration::from_secs(5))).ok();
        Self {
            stream,
            received: String::new(),
        }
    }

    pub fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")
    }

    /// Half-close our side, as a client hanging up would.
    pub fn hang_up(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Read until `needle` appears. Returns everything up to and including
    /// it; anything after stays buffered for the next call. `None` on
    /// timeout or disconnect.
    pub fn read_until(&mut self, needle: &str, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(idx) = self.received.find(needle) {
                let end = idx + needle.len();
                let head = self.received[..end].to_string();
                self.received.replace_range(..end, "");
                return Some(head);
            }

            if Instant::now() > deadline {
                return None;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.stream
                .set_read_timeout(Some(remaining.max(Duration::from_millis(50))))
                .ok();

            let mut buf = [0u8; 4096];
            match self.stream.read(&mut buf) {
                Ok(0) => return None,
                Ok(n) => self
                    .received
                    .push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(_) => return None,
            }
        }
    }

    /// Read whatever arrives within `timeout`, returning early on EOF.
    /// Second value is true when the server closed the connection.
    pub fn drain(&mut self, timeout: Duration) -> (String, bool) {
        let deadline = Instant::now() + timeout;
        let mut closed = false;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.stream
                .set_read_timeout(Some(remaining.max(Duration::from_millis(50))))
                .ok();

            let mut buf = [0u8; 4096];
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    closed = true;
                    break;
                }
                Ok(n) => self
                    .received
                    .push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(_) => {
                    closed = true;
                    break;
                }
            }
        }
        (std::mem::take(&mut self.received), closed)
    }
}

// ── Spawn helpers ───────────────────────────────────────────────────

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tcp-chat"))
}

/// Ask the OS for a port that is free right now.
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("no free port")
}

/// Spawn the server on a fresh port and wait until it accepts connections.
pub fn spawn_server() -> io::Result<ServerHandle> {
    let port = free_port();
    let child = Command::new(binary_path())
        .arg(port.to_string())
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let mut handle = ServerHandle { child, port };

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        // Probe with a connection that is dropped right away; the server
        // sees an immediate EOF during naming and forgets it.
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return Ok(handle);
        }
        if let Some(status) = handle.child.try_wait()? {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("server exited early: {status}"),
            ));
        }
        if Instant::now() > deadline {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "server did not start listening within 5 seconds",
            ));
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Run the binary with `args` to completion, capturing its output.
pub fn run_with_args(args: &[&str]) -> io::Result<Output> {
    Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
}
