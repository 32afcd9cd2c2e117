use crate::monitor::reconcile::CycleOutcome;
use serde::Serialize;

/// Whether a monitor should be shown as available after a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    pub diagnostic: Option<String>,
}

impl Availability {
    pub const fn available() -> Self {
        Self {
            available: true,
            diagnostic: None,
        }
    }
}

/// Fold a cycle into an availability decision.
///
/// One successful offset keeps the monitor available. Only when every offset
/// failed is it unavailable, with all failures joined by `"; "`.
pub fn derive_availability(outcome: &CycleOutcome) -> Availability {
    if outcome.success_count() > 0 {
        return Availability::available();
    }
    Availability {
        available: false,
        diagnostic: Some(outcome.failure_lines().join("; ")),
    }
}
