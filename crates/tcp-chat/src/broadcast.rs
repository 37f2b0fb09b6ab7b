use std::sync::Arc;

use tracing::warn;

use crate::registry::Registry;
use crate::session::{DeliveryError, SessionId};

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(SessionId, DeliveryError)>,
}

impl DeliveryReport {
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// Fans one line out to every registered session.
///
/// Each recipient is handled on its own: a full or closed queue is logged
/// and skipped, and the rest still get the line. Failing sessions stay
/// registered; only their connection handler removes them.
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn broadcast(&self, message: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for session in self.registry.snapshot() {
            match session.send_line(message) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(
                        session_id = %session.id(),
                        name = %session.name(),
                        %error,
                        "broadcast delivery failed"
                    );
                    report.failed.push((session.id(), error));
                }
            }
        }
        report
    }
}
