use std::sync::Arc;

use parking_lot::Mutex;

/// Append-only history of every broadcast line, replayed to new joiners.
///
/// Grows without bound for the life of the process.
#[derive(Default)]
pub struct MessageLog {
    entries: Mutex<Vec<Arc<str>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, message: impl Into<Arc<str>>) {
        self.entries.lock().push(message.into());
    }

    /// Entries in append order.
    pub fn snapshot(&self) -> Vec<Arc<str>> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
