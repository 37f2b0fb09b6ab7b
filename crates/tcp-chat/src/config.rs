/// Port used when none is given on the command line.
pub const DEFAULT_PORT: u16 = 8989;

/// Default capacity of each session's outbound queue, in chunks.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 1024;

/// Configuration for the chat server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind. Defaults to all interfaces.
    pub host: String,
    /// TCP port to listen on. `0` asks the OS for a free port.
    pub port: u16,
    /// Per-session outbound queue capacity. A recipient whose queue is full
    /// misses the message instead of stalling everyone else.
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
        }
    }
}

impl ServerConfig {
    /// Default config listening on `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// `host:port` string handed to the listener.
    pub fn listen_addr(&self) -> String {
        if self.host.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
