//! Inspector-level errors: the core algorithm's `Error` plus the I/O and
//! data-shape problems that only arise once a network client is involved.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] speedcam_core::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response from {source}: {detail}")]
    BadResponse { source: String, detail: String },
}
