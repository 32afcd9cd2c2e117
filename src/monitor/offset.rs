use crate::error::{GridwatchError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Forecast horizon of a monitored quantity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Offset {
    #[serde(rename = "now")]
    Now,
    #[serde(rename = "6h")]
    Forecast6h,
    #[serde(rename = "24h")]
    Forecast24h,
    #[serde(rename = "48h")]
    Forecast48h,
}

impl Offset {
    /// Offsets tracked when a monitor does not say otherwise
    pub const DEFAULT: [Self; 3] = [Self::Now, Self::Forecast6h, Self::Forecast24h];

    pub const ALL: [Self; 4] = [
        Self::Now,
        Self::Forecast6h,
        Self::Forecast24h,
        Self::Forecast48h,
    ];

    /// Value of the `hoursInFuture` query parameter
    pub const fn hours(self) -> u32 {
        match self {
            Self::Now => 0,
            Self::Forecast6h => 6,
            Self::Forecast24h => 24,
            Self::Forecast48h => 48,
        }
    }

    /// Identifier of the quantity this offset feeds
    pub const fn capability(self) -> &'static str {
        match self {
            Self::Now => "status_power_grid_now",
            Self::Forecast6h => "status_power_grid_6h_forecast",
            Self::Forecast24h => "status_power_grid_24h_forecast",
            Self::Forecast48h => "status_power_grid_48h_forecast",
        }
    }

    /// Identifier of the change trigger downstream rules subscribe to
    pub const fn trigger_id(self) -> &'static str {
        match self {
            Self::Now => "current-grid-status-changed",
            Self::Forecast6h => "6h-forecast-grid-status-changed",
            Self::Forecast24h => "24h-forecast-grid-status-changed",
            Self::Forecast48h => "48h-forecast-grid-status-changed",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Forecast6h => "6h",
            Self::Forecast24h => "24h",
            Self::Forecast48h => "48h",
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Offset {
    type Err = GridwatchError;

    /// Accepts the short label (`now`, `6h`) or the capability identifier
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|o| o.label().eq_ignore_ascii_case(s) || o.capability() == s)
            .ok_or_else(|| {
                GridwatchError::validation("quantity", format!("Unknown quantity '{}'", s))
            })
    }
}
