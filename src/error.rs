//! The error taxonomy returned by every fallible operation in this crate.

use std::fmt;

/// The result type returned throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced while decoding or navigating an ext2/3/4 volume.
///
/// The core never logs or prints; every failure is surfaced here for the
/// caller to handle, format, or ignore as it sees fit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The on-disk bytes violate the format (bad signature, a directory
    /// record with an impossible size, a non-UTF-8 name, ...).
    #[error("malformed filesystem: {0}")]
    Malformed(String),

    /// The volume is well-formed but uses a feature this reader does not
    /// implement (an oversized block size, ext4 extents, ...).
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// A caller-supplied identifier (inode id, group id) is out of range.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The caller asked to enumerate the entries of a non-directory inode.
    #[error("not a directory: inode {0}")]
    NotADirectory(u32),

    /// The underlying byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(msg: impl fmt::Display) -> Self {
        Error::Malformed(msg.to_string())
    }

    pub(crate) fn unsupported(msg: impl fmt::Display) -> Self {
        Error::Unsupported(msg.to_string())
    }

    pub(crate) fn invalid_id(msg: impl fmt::Display) -> Self {
        Error::InvalidId(msg.to_string())
    }
}
