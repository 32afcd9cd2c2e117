//! One poll cycle for one monitored entity
//!
//! All offsets are queried concurrently. Results are then applied to the
//! entity one offset at a time, in offset order, while the caller holds the
//! entity mutably; no two updates of the same stored value can interleave.

use crate::grid::{GridState, GridStatusSource};
use crate::logging::{LogContext, get_logger_with_context};
use crate::monitor::events::{ChangeEvent, EventSink};
use crate::monitor::{MonitoredEntity, Offset};
use futures::future::join_all;
use serde::Serialize;

/// Result of querying one offset in one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffsetResult {
    Success { state: GridState, changed: bool },
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetOutcome {
    pub offset: Offset,
    pub result: OffsetResult,
}

impl OffsetOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self.result, OffsetResult::Success { .. })
    }

    /// `<quantity>: <message>` for failures
    pub fn failure_line(&self) -> Option<String> {
        match &self.result {
            OffsetResult::Failure { message } => {
                Some(format!("{}: {}", self.offset.capability(), message))
            }
            OffsetResult::Success { .. } => None,
        }
    }
}

/// Every offset's outcome for one cycle, in offset order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    pub outcomes: Vec<OffsetOutcome>,
}

impl CycleOutcome {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(OffsetOutcome::failure_line)
            .collect()
    }

    pub fn get(&self, offset: Offset) -> Option<&OffsetOutcome> {
        self.outcomes.iter().find(|o| o.offset == offset)
    }
}

/// Run one poll cycle: query, compare, store, emit.
///
/// Never fails: per-offset errors become [`OffsetResult::Failure`] and the
/// stored value of that offset is left as it was.
pub async fn reconcile(
    entity: &mut MonitoredEntity,
    source: &dyn GridStatusSource,
    sink: &dyn EventSink,
) -> CycleOutcome {
    let logger = get_logger_with_context(LogContext::new("reconcile").with_zip(entity.zip().as_str()));
    let offsets = entity.offsets().to_vec();

    let fetched = {
        let zip = entity.zip();
        join_all(
            offsets
                .iter()
                .map(|offset| source.fetch_status(zip, offset.hours())),
        )
        .await
    };

    let mut outcome = CycleOutcome::default();
    for (offset, fetched) in offsets.into_iter().zip(fetched) {
        let result = match fetched {
            Ok(state) => {
                let changed = entity.store(offset, state);
                if changed {
                    logger.info(&format!(
                        "Capability {} changed to: {}",
                        offset.capability(),
                        state
                    ));
                    let event = ChangeEvent::new(entity.zip().as_str(), offset, state);
                    if let Err(e) = sink.emit(event) {
                        logger.warn(&format!(
                            "Failed to deliver change event for {}: {}",
                            offset.capability(),
                            e
                        ));
                    }
                }
                OffsetResult::Success { state, changed }
            }
            Err(e) => {
                logger.error(&format!("Failed to update {}: {}", offset.capability(), e));
                OffsetResult::Failure {
                    message: e.to_string(),
                }
            }
        };
        outcome.outcomes.push(OffsetOutcome { offset, result });
    }
    outcome
}
