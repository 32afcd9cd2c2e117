//! Change events and their delivery
//!
//! Events are fire-and-forget: a sink reports delivery problems as an error,
//! the reconciler logs it and moves on.

use crate::error::{GridwatchError, Result};
use crate::grid::GridState;
use crate::monitor::Offset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A quantity of a monitor moved to a new state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub zip: String,
    /// Capability identifier of the changed quantity
    pub quantity: String,
    pub offset: Offset,
    pub hours_in_future: u32,
    /// Trigger identifier downstream rules subscribe to
    pub trigger: String,
    pub state: GridState,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(zip: &str, offset: Offset, state: GridState) -> Self {
        Self {
            id: Uuid::new_v4(),
            zip: zip.to_string(),
            quantity: offset.capability().to_string(),
            offset,
            hours_in_future: offset.hours(),
            trigger: offset.trigger_id().to_string(),
            state,
            timestamp: Utc::now(),
        }
    }
}

/// Destination of change events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ChangeEvent) -> Result<()>;
}

/// Sink fanning events out to every subscriber of a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: ChangeEvent) -> Result<()> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|e| GridwatchError::event(format!("no subscriber for {}", e.0.trigger)))
    }
}

/// Conditions a downstream rule puts on the events it reacts to.
///
/// Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TriggerFilter {
    pub zip: Option<String>,
    pub quantity: Option<Offset>,
    /// Only fire when the new state equals this one
    pub only_for_status: Option<GridState>,
}

impl TriggerFilter {
    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        self.zip.as_deref().is_none_or(|zip| zip == event.zip)
            && self.quantity.is_none_or(|q| q == event.offset)
            && self.only_for_status.is_none_or(|s| s == event.state)
    }
}
