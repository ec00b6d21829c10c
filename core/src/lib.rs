//! Inode-table and directory-entry scanner core.
//!
//! This crate enumerates every in-use inode of an ext2/3/4 volume and
//! reconstructs a full pathname for each one, driven directly off the
//! inode table and directory-entry blocks rather than a recursive
//! directory walk. The two on-disk passes and the graph they build are
//! the whole of this crate; talking to an actual volume is delegated to
//! whatever implements [`volume::VolumeReader`].

pub mod bitfield;
pub mod dirent_store;
pub mod emitter;
pub mod error;
pub mod inode_table;
pub mod packed_vector;
pub mod path_resolver;
pub mod scanner;
pub mod volume;

pub use bitfield::Bitfield;
pub use dirent_store::DirentStore;
pub use emitter::{Emitter, TimeMode};
pub use error::CoreError;
pub use inode_table::InodeTable;
pub use packed_vector::PackedVector;
pub use path_resolver::{PathResolveError, PathResolver};
pub use scanner::{Scanner, ScannerOptions};
pub use volume::{DirIterControl, ScannedInode, VolumeError, VolumeReader};

/// Conventional upper bound on an absolute path length, matching `PATH_MAX`
/// on Linux. Resolution failures that would overflow this are warned, not
/// fatal.
pub const PATH_MAX: usize = 4096;

/// Maximum number of path components [`path_resolver::PathResolver`] will
/// walk before declaring the chain malformed.
pub const MAX_PATH_DEPTH: usize = 255;

/// The root directory's inode number by ext2/3/4 convention.
pub const ROOT_INO: u32 = 2;
