//! Board event broadcaster
//!
//! Publishing is best-effort and at-most-once. The event is serialized once
//! and queued on every connection viewing its board; nothing is buffered for
//! boards nobody is viewing. A connection that cannot take the frame is
//! logged and skipped, and the publisher never sees an error: the mutation
//! behind the event has already been committed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::connection::Frame;
use super::registry::ConnectionRegistry;
use crate::types::BoardEvent;

/// Outcome of one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    /// Number of subscribers the event was offered to
    pub fn subscribers(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Fans board events out to the board's subscribers
pub struct BoardBroadcaster {
    registry: Arc<ConnectionRegistry>,
    published: AtomicU64,
}

impl BoardBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            published: AtomicU64::new(0),
        }
    }

    /// Deliver `event` to every connection currently viewing its board
    pub fn publish(&self, event: &BoardEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let frame: Frame = match serde_json::to_string(event) {
            Ok(json) => Frame::from(json),
            Err(e) => {
                tracing::error!("[Broadcast] Failed to serialize {}: {}", event.type_name(), e);
                return report;
            }
        };

        let subscribers = self.registry.for_each_subscriber(&event.board_id, |connection| {
            match connection.deliver(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("[Broadcast] Delivery failed: {}", e);
                }
            }
        });

        if subscribers == 0 {
            tracing::debug!(
                "[Broadcast] No viewers for board {}, dropping {}",
                event.board_id,
                event.type_name()
            );
            return report;
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "[Broadcast] {} on board {} delivered to {}/{}",
            event.type_name(),
            event.board_id,
            report.delivered,
            report.subscribers()
        );
        report
    }

    /// Number of events that reached at least the fan-out stage
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
