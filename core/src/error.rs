//! Error types for the scanner core.
//!
//! Mirrors the fatal/per-record split the scanner observes: [`CoreError`] is
//! returned only from situations the scanner treats as fatal mid-run. Scan
//! errors on individual inodes or directory entries never reach here — the
//! scanner logs them at `warn` and moves on.

use thiserror::Error;

use crate::path_resolver::PathResolveError;
use crate::volume::VolumeError;

/// Fatal errors from a scanner run.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The underlying volume reader failed in a way pass 1 or pass 2 cannot
    /// route around (as opposed to a per-inode/per-entry error, which is
    /// logged and skipped).
    #[error("volume reader failed: {0}")]
    Volume(#[from] VolumeError),

    /// [`crate::inode_table::InodeTable::lookup`] was asked for an inode
    /// that is not in the table. This is a programming error, not a
    /// recoverable condition: every child inode referenced by a directory
    /// entry during pass 2 must already have been recorded in pass 1.
    #[error("inode {0} referenced by a directory entry was never recorded by the inode scan")]
    InodeLookupMiss(u32),

    /// A packed buffer could not grow any further.
    #[error("allocation failed while growing a packed buffer")]
    OutOfMemory,
}

/// Re-exported so callers that only need the enum above don't have to touch
/// the `path_resolver` module.
pub type ResolveError = PathResolveError;
