//! Internal error type for disk access and structure parsing.
//!
//! This is richer than [`e2paths_core::volume::VolumeError`] on purpose:
//! it carries enough detail for a `--debug` log line, and is converted down
//! to the narrower core error at the [`VolumeReader`](e2paths_core::VolumeReader)
//! boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolioError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an ext2/3/4 filesystem: bad superblock magic")]
    BadMagic,

    #[error("unsupported filesystem feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("block group {0} descriptor table is out of range")]
    BadGroupDescriptor(u32),

    #[error("inode {0} is out of range for this volume")]
    BadInode(u32),

    #[error("corrupt extent tree reading inode {0}")]
    CorruptExtentTree(u32),

    #[error("directory inode {0} has no mapped data blocks")]
    EmptyDirectory(u32),
}
