//! The ext2/3/4 on-disk superblock, parsed by byte offset rather than cast
//! through a `#[repr(C)]` struct.
//!
//! The reference driver (`fs/ext4/sb.rs` in the kernel tree this crate grew
//! out of) reads the superblock as a single `ptr::read` of a `Ext4Superblock`
//! struct. That only works because the kernel build pins a layout where the
//! compiler never inserts padding the on-disk format doesn't have; porting
//! the same struct to an arbitrary host target risks silent misalignment
//! (e.g. `mmp_block: u64` would gain padding after the preceding `u16`
//! fields on some targets). Reading every field by explicit byte range
//! sidesteps that risk entirely, the same way `fs/ext4/dir.rs` decodes a raw
//! directory entry by slicing rather than casting.

use crate::error::VolioError;

pub const SUPERBLOCK_OFFSET: u64 = 1024;
pub const SUPERBLOCK_SIZE: usize = 1024;

const MAGIC: u16 = 0xEF53;

pub const INCOMPAT_FILETYPE: u32 = 0x0002;
pub const INCOMPAT_EXTENTS: u32 = 0x0040;
pub const INCOMPAT_64BIT: u32 = 0x0080;
pub const INCOMPAT_META_BG: u32 = 0x0010;

fn u16_at(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes(buf[off..off + 2].try_into().unwrap())
}

fn u32_at(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

/// Fields pulled out of the 1024-byte on-disk superblock. Only what the
/// scanner and the rest of this crate actually consume; `fs/ext4/sb.rs`
/// tracks dozens of other fields (quotas, MMP, error-report ring) this tool
/// has no use for.
#[derive(Clone, Copy, Debug)]
pub struct Superblock {
    pub inodes_count: u32,
    pub blocks_count: u64,
    pub first_data_block: u32,
    pub log_block_size: u32,
    pub blocks_per_group: u32,
    pub inodes_per_group: u32,
    pub rev_level: u32,
    pub first_ino: u32,
    pub inode_size: u16,
    pub feature_incompat: u32,
    pub desc_size: u16,
}

impl Superblock {
    /// Parses a 1024-byte buffer read from [`SUPERBLOCK_OFFSET`].
    pub fn parse(buf: &[u8; SUPERBLOCK_SIZE]) -> Result<Self, VolioError> {
        let magic = u16_at(buf, 56);
        if magic != MAGIC {
            return Err(VolioError::BadMagic);
        }

        let rev_level = u32_at(buf, 76);
        let feature_incompat = u32_at(buf, 96);

        // first_ino/inode_size/desc_size only exist from EXT2_DYNAMIC_REV
        // (rev_level >= 1) onward; GOOD_OLD_REV volumes fix these at their
        // historical defaults.
        let (first_ino, inode_size, desc_size) = if rev_level == 0 {
            (11, 128, 32)
        } else {
            let desc_size = u16_at(buf, 254);
            let desc_size = if feature_incompat & INCOMPAT_64BIT != 0 && desc_size >= 32 {
                desc_size
            } else {
                32
            };
            (u32_at(buf, 84), u16_at(buf, 88), desc_size)
        };

        let blocks_count_lo = u32_at(buf, 4);
        let blocks_count_hi = if feature_incompat & INCOMPAT_64BIT != 0 {
            u32_at(buf, 336)
        } else {
            0
        };

        Ok(Superblock {
                inodes_count: u32_at(buf, 0),
                blocks_count: ((blocks_count_hi as u64) << 32) | blocks_count_lo as u64,
                first_data_block: u32_at(buf, 20),
                log_block_size: u32_at(buf, 24),
                blocks_per_group: u32_at(buf, 32),
                inodes_per_group: u32_at(buf, 40),
                rev_level,
                first_ino,
                inode_size,
                feature_incompat,
                desc_size,
            })
    }

    pub fn block_size(&self) -> u64 {
        1024 << self.log_block_size
    }

    pub fn group_count(&self) -> u32 {
        let per_group = self.blocks_per_group as u64;
        if per_group == 0 {
            return 0;
        }
        let usable = self.blocks_count.saturating_sub(self.first_data_block as u64);
        ((usable + per_group - 1) / per_group) as u32
    }

    pub fn uses_extents(&self) -> bool {
        self.feature_incompat & INCOMPAT_EXTENTS != 0
    }

    pub fn uses_filetype(&self) -> bool {
        self.feature_incompat & INCOMPAT_FILETYPE != 0
    }

    pub fn uses_64bit(&self) -> bool {
        self.feature_incompat & INCOMPAT_64BIT != 0
    }

    /// First block holding the group descriptor table, following the same
    /// rule `block_grp.rs::GroupDescriptor::load_descriptor` uses: the
    /// superblock occupies a whole block only when the block size equals
    /// its own on-disk size (1024-byte blocks), otherwise it shares block 0
    /// with the boot sector and the GDT starts right after it either way.
    pub fn gdt_start_block(&self) -> u64 {
        if self.block_size() == SUPERBLOCK_SIZE as u64 {
            2
        } else {
            1
        }
    }
}
