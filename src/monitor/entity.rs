use crate::error::{GridwatchError, Result};
use crate::grid::GridState;
use crate::monitor::Offset;
use crate::zip::PostalCode;
use std::collections::BTreeMap;

/// A monitored postal code and its last known state per tracked offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredEntity {
    zip: PostalCode,
    name: String,
    offsets: Vec<Offset>,
    values: BTreeMap<Offset, GridState>,
}

impl MonitoredEntity {
    /// New entity tracking the default offsets, every value unset
    pub fn new(zip: PostalCode) -> Self {
        let name = default_name(&zip);
        Self {
            zip,
            name,
            offsets: Offset::DEFAULT.to_vec(),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the tracked offsets; they are kept sorted and deduplicated
    pub fn with_offsets(mut self, offsets: &[Offset]) -> Result<Self> {
        let mut offsets = offsets.to_vec();
        offsets.sort_unstable();
        offsets.dedup();
        if offsets.is_empty() {
            return Err(GridwatchError::validation(
                "offsets",
                "At least one offset must be tracked",
            ));
        }
        self.values.retain(|offset, _| offsets.contains(offset));
        self.offsets = offsets;
        Ok(self)
    }

    pub const fn zip(&self) -> &PostalCode {
        &self.zip
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tracked offsets in reconciliation order
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Stored value, `None` until the first successful read
    pub fn value(&self, offset: Offset) -> Option<GridState> {
        self.values.get(&offset).copied()
    }

    /// Store `state` for `offset`; returns whether it differs from before.
    ///
    /// The value is written even when unchanged.
    pub fn store(&mut self, offset: Offset, state: GridState) -> bool {
        self.values.insert(offset, state) != Some(state)
    }
}

/// Display name used when registration does not provide one
pub fn default_name(zip: &PostalCode) -> String {
    format!("Grid Monitor for {}", zip)
}
