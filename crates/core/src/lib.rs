#![warn(clippy::all, missing_docs)]

//! Core domain logic for the lounge manager.
//!
//! This crate hosts the session/billing engine: station state tracking,
//! tiered-rate cost computation with promotional offers, the pending-order
//! queue for walk-up customers, the persistent bill ledger and the daily
//! revenue summary. The terminal UI (and any future front end) drives it
//! through these types and renders their outputs.

pub mod billing;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod pending;
pub mod session;
pub mod summary;

pub use billing::{BillBreakdown, OfferQuote, OfferTier};
pub use config::{PriceConfig, SettingsForm};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EngineEvents};
pub use ledger::{CsvLedger, LedgerRecord, LedgerStore};
pub use pending::{PendingOrder, PendingOrderQueue};
pub use session::{ServiceCharge, SessionRegistry, Station, StationId};
pub use summary::DailySummary;
