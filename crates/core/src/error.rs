//! Typed failures surfaced by the engine.
//!
//! Every operation that can be misused returns one of these variants with a
//! human-readable message; the presentation layer displays it and leaves
//! engine state unchanged. None of them abort the process.

use thiserror::Error;

use crate::session::StationId;

/// Errors produced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A settings field failed validation (non-numeric or non-positive rate).
    #[error("invalid settings: {0}")]
    Validation(String),

    /// Attempted to start a station that already has a running session.
    #[error("{0} is already in use")]
    AlreadyActive(StationId),

    /// Attempted a session operation on an idle station.
    #[error("{0} is not active")]
    NotActive(StationId),

    /// Service name is not present in the current price configuration.
    #[error("unknown service '{0}'")]
    UnknownService(String),

    /// A pending order was submitted without any services.
    #[error("order has no services")]
    EmptyOrder,

    /// A pending order was submitted without a customer name.
    #[error("customer name is required")]
    EmptyName,

    /// A positional index no longer matches the list it was taken from.
    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange {
        /// The rejected position.
        index: usize,
        /// Length of the list at the time of the call.
        len: usize,
    },

    /// Ledger or settings file IO failed. The in-memory state that was being
    /// persisted is left intact so the caller can retry.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Convenience alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
