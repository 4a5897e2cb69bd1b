//! Error taxonomy for the scanner and emitter.
//!
//! `FatalIo` and `InvalidRegion` are meant to propagate out of `main` and
//! cause a non-zero exit. `MalformedCigar` and `TransientRegion` are caught
//! at their respective loop heads and only skip the offending read/region.
//! `SoftWarning` never changes control flow; it is logged and ignored.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanItdError {
    #[error("fatal I/O error: {0}")]
    FatalIo(String),

    #[error("invalid target region: {0}")]
    InvalidRegion(String),

    #[error("malformed CIGAR string: {0}")]
    MalformedCigar(String),

    #[error("transient error while iterating region: {0}")]
    TransientRegion(String),

    #[error("{0}")]
    SoftWarning(String),
}

pub type ScanItdResult<T> = Result<T, ScanItdError>;
