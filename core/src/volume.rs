//! The boundary between the scanner core and an actual ext2/3/4 volume.
//!
//! The low-level ext2/3/4 volume reader is deliberately out of scope here;
//! the core consumes only a narrow interface. This module is that
//! interface, expressed as a trait so the scanner can be exercised against
//! an in-memory fake in tests without linking a real filesystem library.

use thiserror::Error;

/// One record produced while scanning the inode table via
/// [`VolumeReader::scan_inodes`]. Exposes exactly the fields pass 1 needs.
#[derive(Clone, Copy, Debug)]
pub struct ScannedInode {
    pub ino: u32,
    pub is_dir: bool,
    pub links_count: u16,
    pub mtime: u32,
    pub ctime: u32,
}

/// Returned from the callback passed to [`VolumeReader::iterate_dir`] to
/// mirror libext2fs's `dir_iterate2` early-exit protocol: the callback may
/// return early without visiting every entry in a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirIterControl {
    Continue,
    Stop,
}

/// Errors a [`VolumeReader`] can report.
///
/// `PerInode`/`PerEntry` are recoverable — the scanner logs them at `warn`
/// and moves on. Every
/// other variant is fatal and aborts the run.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("failed to open filesystem: {0}")]
    Open(String),

    #[error("inode scan could not be opened: {0}")]
    ScanOpen(String),

    #[error("directory iteration failed on inode {ino}: {source}")]
    DirIteration { ino: u32, source: String },

    #[error("error reading inode {ino}, skipping: {source}")]
    PerInode { ino: u32, source: String },
}

/// The narrow interface the scanner core requires from an ext2/3/4 volume.
/// An implementation over a real filesystem lives in the separate
/// `e2paths-volio` crate; `open`/`close` are modeled as ordinary
/// construction and `Drop` rather than explicit trait methods, since Rust
/// ownership already scopes the handle's lifetime without an extra call.
pub trait VolumeReader {
    /// Total count of inodes (used and free) configured for this volume.
    fn inode_count(&self) -> u32;

    /// The first inode number that is not reserved for filesystem-internal
    /// use.
    fn first_usable_inode(&self) -> u32;

    /// Iterates every inode record in ascending inode-number order,
    /// terminated by `ino == 0`. Per-inode errors are
    /// reported through the iterator's `Result` item rather than aborting
    /// the whole scan, so pass 1 can warn-and-skip.
    /// Boxed rather than an associated type so the trait stays
    /// object-agnostic and a volume with ~10^8 inodes never has to
    /// materialize the whole scan in memory up front.
    fn scan_inodes(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = Result<ScannedInode, VolumeError>> + '_>, VolumeError>;

    /// Iterates the directory entries of `dir_ino`, calling `visit` with
    /// each entry's child inode number and raw name bytes. `visit` returns
    /// [`DirIterControl::Stop`] to end iteration early.
    fn iterate_dir(
        &mut self,
        dir_ino: u32,
        visit: &mut dyn FnMut(u32, &[u8]) -> DirIterControl,
    ) -> Result<(), VolumeError>;
}
