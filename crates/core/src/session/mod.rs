//! Station session state and its registry.

pub mod models;
pub mod registry;

pub use models::{ServiceCharge, Station, StationId};
pub use registry::SessionRegistry;
