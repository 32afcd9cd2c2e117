//! Grid status monitors
//!
//! A monitor owns one postal code and the last known [`GridState`] per
//! tracked [`Offset`]. Each poll cycle fans out one query per offset,
//! reconciles the results into the stored values, emits change events and
//! folds the per-offset outcomes into an availability decision.
//!
//! [`GridState`]: crate::grid::GridState

pub mod availability;
pub mod entity;
pub mod events;
pub mod offset;
pub mod reconcile;
pub mod registry;
pub mod runtime;
pub mod snapshot;

pub use availability::{Availability, derive_availability};
pub use entity::MonitoredEntity;
pub use events::{BroadcastSink, ChangeEvent, EventSink, TriggerFilter};
pub use offset::Offset;
pub use reconcile::{CycleOutcome, OffsetOutcome, OffsetResult, reconcile};
pub use registry::MonitorRegistry;
pub use runtime::{MonitorHandle, spawn_monitor};
pub use snapshot::{MonitorSnapshot, OffsetStateView};
