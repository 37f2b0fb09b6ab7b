//! Process-wide chat state shared by every connection handler.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::broadcast::{Broadcaster, DeliveryReport};
use crate::config::DEFAULT_OUTBOUND_QUEUE;
use crate::message_log::MessageLog;
use crate::protocol;
use crate::registry::Registry;
use crate::session::Session;

/// Registry, message log and broadcaster behind one ordering lock.
///
/// Every broadcast is paired with its log append under `order`, so the log
/// records lines in exactly the order recipients' queues received them. Join
/// runs its register/replay/announce steps under the same lock, so a joiner
/// sees each logged line exactly once, either replayed or live.
pub struct ChatRoom {
    registry: Arc<Registry>,
    log: MessageLog,
    broadcaster: Broadcaster,
    order: Mutex<()>,
    outbound_queue: usize,
}

impl Default for ChatRoom {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_QUEUE)
    }
}

impl ChatRoom {
    pub fn new(outbound_queue: usize) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            broadcaster: Broadcaster::new(Arc::clone(&registry)),
            registry,
            log: MessageLog::new(),
            order: Mutex::new(()),
            outbound_queue,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Queue capacity for sessions created against this room.
    pub fn outbound_queue(&self) -> usize {
        self.outbound_queue
    }

    /// Broadcast `message` to all members and append it to the log.
    pub fn publish(&self, message: String) -> DeliveryReport {
        let _order = self.order.lock();
        let report = self.broadcaster.broadcast(&message);
        self.log.append(message);
        report
    }

    /// Register `session`, replay the log to it, then announce it to everyone
    /// including itself.
    pub fn join(&self, session: &Arc<Session>) -> DeliveryReport {
        let _order = self.order.lock();
        self.registry.add(Arc::clone(session));

        let history = self.log.snapshot();
        if let Err(error) = session.send_lines(history.iter().map(|m| &**m)) {
            warn!(
                session_id = %session.id(),
                name = %session.name(),
                %error,
                "error sending previous messages"
            );
        }

        let announcement = protocol::join_announcement(session.name());
        let report = self.broadcaster.broadcast(&announcement);
        self.log.append(announcement);
        report
    }

    /// Deregister `session` and announce its departure to the remaining
    /// members. Returns `None` when it was not registered, in which case
    /// nothing is broadcast or logged.
    pub fn leave(&self, session: &Session) -> Option<DeliveryReport> {
        let _order = self.order.lock();
        if !self.registry.remove(session.id()) {
            return None;
        }
        let announcement = protocol::leave_announcement(session.name());
        let report = self.broadcaster.broadcast(&announcement);
        self.log.append(announcement);
        Some(report)
    }
}
