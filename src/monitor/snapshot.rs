use crate::grid::GridState;
use crate::monitor::{Availability, CycleOutcome, MonitoredEntity, Offset};
use serde::Serialize;

/// Stored state of one tracked quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetStateView {
    pub quantity: String,
    pub offset: Offset,
    pub hours_in_future: u32,
    pub state: Option<GridState>,
}

/// Read-only view of a monitor, published after every poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorSnapshot {
    pub zip: String,
    pub name: String,
    pub states: Vec<OffsetStateView>,
    pub available: bool,
    pub diagnostic: Option<String>,
    /// Failures of the last cycle, also when the monitor stayed available
    pub last_errors: Vec<String>,
    /// RFC 3339 timestamp of the last completed cycle
    pub last_poll: Option<String>,
    pub total_polls: u64,
}

impl MonitorSnapshot {
    /// Snapshot of a monitor that has not polled yet
    pub fn initial(entity: &MonitoredEntity) -> Self {
        Self {
            zip: entity.zip().to_string(),
            name: entity.name().to_string(),
            states: views(entity),
            available: true,
            diagnostic: None,
            last_errors: Vec::new(),
            last_poll: None,
            total_polls: 0,
        }
    }

    /// Snapshot after a completed cycle
    pub fn after_cycle(
        entity: &MonitoredEntity,
        outcome: &CycleOutcome,
        availability: &Availability,
        total_polls: u64,
    ) -> Self {
        Self {
            zip: entity.zip().to_string(),
            name: entity.name().to_string(),
            states: views(entity),
            available: availability.available,
            diagnostic: availability.diagnostic.clone(),
            last_errors: outcome.failure_lines(),
            last_poll: Some(chrono::Utc::now().to_rfc3339()),
            total_polls,
        }
    }

    pub fn state(&self, offset: Offset) -> Option<GridState> {
        self.states
            .iter()
            .find(|v| v.offset == offset)
            .and_then(|v| v.state)
    }

    /// "Grid status is X" condition; false while the quantity is unset
    pub fn is_status(&self, offset: Offset, state: GridState) -> bool {
        self.state(offset) == Some(state)
    }
}

fn views(entity: &MonitoredEntity) -> Vec<OffsetStateView> {
    entity
        .offsets()
        .iter()
        .map(|offset| OffsetStateView {
            quantity: offset.capability().to_string(),
            offset: *offset,
            hours_in_future: offset.hours(),
            state: entity.value(*offset),
        })
        .collect()
}
