//! # Gridwatch - StromGedacht grid status monitor
//!
//! Polls the StromGedacht API for the current and forecast grid state of one
//! or more German postal codes and raises a change event whenever a tracked
//! quantity moves to a different state.
//!
//! ## Architecture
//!
//! - `grid`: grid states, state-code mapping and the StromGedacht HTTP client
//! - `zip`: postal code format check and pre-admission validation
//! - `monitor`: per-postal-code entities, the poll cycle, availability policy,
//!   change events and the periodic runtime
//! - `config`: YAML configuration with validation
//! - `logging`: structured logging and tracing
//! - `web`: HTTP API, server-sent change events and OpenAPI docs

pub mod config;
pub mod error;
pub mod grid;
pub mod logging;
pub mod monitor;
#[cfg(feature = "web")]
pub mod web;
pub mod zip;

// Re-export commonly used types
pub use config::Config;
pub use error::{GridwatchError, Result};
pub use grid::{GridState, GridStatusSource, StromGedachtClient};
pub use monitor::{MonitorRegistry, Offset};
pub use zip::PostalCode;

#[cfg(all(test, feature = "web"))]
mod web_tests;
