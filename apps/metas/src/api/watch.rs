//! # Change Feed
//!
//! Live change notifications, modeling the document store's snapshot
//! subscriptions: mutating handlers publish an event, subscribers
//! re-read whatever they display.
//!
//! Delivery guarantees are deliberately weak, and consumers must cope:
//! - No ordering across concurrent mutations
//! - No deduplication
//! - Slow subscribers skip over missed events (lag), they never block
//!   the publisher
//!
//! Dropping a [`ChangeSubscription`] is the unsubscribe; there is no
//! separate cancellation call.

use metas_core::{KrId, TeamId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffered events per subscriber before lag kicks in.
const FEED_CAPACITY: usize = 256;

// =============================================================================
// EVENTS
// =============================================================================

/// A document change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    KrUpserted { id: KrId },
    CheckpointAppended { kr_id: KrId },
    UserUpserted { id: UserId },
    TeamUpserted { id: TeamId },
}

// =============================================================================
// FEED
// =============================================================================

/// Fan-out publisher for change events.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    /// Create a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Subscribe to future events. The returned handle unsubscribes on
    /// drop.
    #[must_use]
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription { rx: self.tx.subscribe() }
    }

    /// Publish an event to all current subscribers. A feed with no
    /// subscribers silently drops the event; publishing never fails.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription; drop it to unsubscribe.
#[derive(Debug)]
pub struct ChangeSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Wait for the next event. Lagged stretches are skipped; `None`
    /// means the feed itself is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
