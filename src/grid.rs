//! StromGedacht grid status API
//!
//! The remote service answers with an integer `state` per postal code and
//! forecast horizon. `state` maps that integer onto [`GridState`]; `client`
//! owns the HTTP side and the [`GridStatusSource`] seam used by the monitors.

pub mod client;
pub mod state;

pub use client::{
    DEFAULT_BASE_URL, GridStatusSource, StromGedachtClient, parse_status_body, status_url,
    validation_url,
};
pub use state::{GridState, map_state};
