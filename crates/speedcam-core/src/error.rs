//! Error kinds meaningful without any I/O.
//!
//! The inspector binary wraps these in its own `Error` alongside transient I/O and
//! data-shape kinds that only arise once a network client is involved.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Bad path-request syntax, an unparsable IA, or similar caller-input problems.
    /// Logged and skipped by the caller; the round continues.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Adding an AS that already exists, or connecting a pair that's already
    /// connected. Surfaced to direct callers; the path-request ingestion boundary
    /// suppresses the "already connected" case and treats "already present" as a
    /// no-op, since re-announced paths are expected, not exceptional.
    #[error("duplicate graph mutation: {0}")]
    DuplicateGraphMutation(String),

    /// Too few samples to differentiate, or another shape mismatch in collected
    /// data. Logged; the affected worker's contribution is dropped.
    #[error("unusable data shape: {0}")]
    DataShape(String),

    /// Unknown scale type, log base of 1, negative scale param, unknown interval
    /// strategy. Fatal to the process — never caught and continued past.
    #[error("fatal configuration error: {0}")]
    ConfigFatal(String),
}
