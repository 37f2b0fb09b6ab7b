use std::io;

/// Errors surfaced by the chat server.
///
/// Per-connection I/O failures never show up here: a handler treats them as a
/// disconnect. Only startup and listener failures are returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
