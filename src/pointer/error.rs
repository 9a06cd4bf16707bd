// ABOUTME: Pointer store error types with SNAFU context selectors.
// ABOUTME: Separates I/O failures from corrupt or foreign pointer records.

use snafu::Snafu;
use std::path::PathBuf;

/// Failure reading or writing the environment pointer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PointerError {
    #[snafu(display("failed to read pointer record {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to write pointer record {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("pointer record {} is corrupt: {source}", path.display()))]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("failed to encode pointer record: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("'{name}' is not one of the configured environments"))]
    UnknownEnvironment { name: String },

    #[snafu(display("pointer backend unavailable: {message}"))]
    Unavailable { message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerErrorKind {
    /// The backing storage could not be read or written.
    Io,
    /// The stored record could not be decoded.
    Corrupt,
    /// A role outside the configured pair was read or requested.
    UnknownEnvironment,
}

impl PointerError {
    pub fn kind(&self) -> PointerErrorKind {
        match self {
            PointerError::Read { .. }
            | PointerError::Write { .. }
            | PointerError::Unavailable { .. } => PointerErrorKind::Io,
            PointerError::Corrupt { .. } | PointerError::Encode { .. } => {
                PointerErrorKind::Corrupt
            }
            PointerError::UnknownEnvironment { .. } => PointerErrorKind::UnknownEnvironment,
        }
    }
}
