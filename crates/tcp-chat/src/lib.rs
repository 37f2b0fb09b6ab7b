//! Multi-client line-oriented chat over TCP.
//!
//! Clients connect, pick a display name, and exchange `\n`-terminated lines
//! that are broadcast to every connected peer. New joiners receive a replay of
//! everything broadcast so far.
//!
//! The shared state lives in a [`ChatRoom`] (registry of live sessions plus
//! the message log), and every accepted connection is driven by its own
//! [`ConnectionHandler`] task.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod handler;
pub mod message_log;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;

pub use broadcast::{Broadcaster, DeliveryReport};
pub use config::ServerConfig;
pub use error::{ChatError, Result};
pub use handler::{ConnectionHandler, ConnectionState};
pub use message_log::MessageLog;
pub use registry::Registry;
pub use room::ChatRoom;
pub use server::ChatServer;
pub use session::{Session, SessionId};
