//! [`Ext2Volume`]: the [`VolumeReader`] implementation this whole crate
//! exists to provide, reading superblock, group descriptors, inodes and
//! directory blocks straight off a `File` the way `fs/ext4/mod.rs::Ext4Fs`
//! reads them off an AHCI drive.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use e2paths_core::volume::{DirIterControl, ScannedInode, VolumeError, VolumeReader};

use crate::block_group::GroupDescriptor;
use crate::dir;
use crate::error::VolioError;
use crate::extent;
use crate::inode::RawInode;
use crate::superblock::{Superblock, SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE};

fn volio_open(err: VolioError) -> VolumeError {
    VolumeError::Open(err.to_string())
}

/// Opens and reads an ext2/3/4 volume (a block device node or a plain image
/// file — `std::fs::File` treats both the same way). `inode_count`/
/// `first_usable_inode` come straight from the parsed superblock; the
/// heavier work is in `scan_inodes`/`iterate_dir`, which translate to raw
/// block reads against `file`.
pub struct Ext2Volume {
    file: File,
    sb: Superblock,
    groups: Vec<GroupDescriptor>,
}

impl Ext2Volume {
    pub fn open(path: &Path) -> Result<Self, VolioError> {
        let mut file = File::open(path)?;

        file.seek(SeekFrom::Start(SUPERBLOCK_OFFSET))?;
        let mut raw_sb = [0u8; SUPERBLOCK_SIZE];
        file.read_exact(&mut raw_sb)?;
        let sb = Superblock::parse(&raw_sb)?;

        let groups = Self::load_group_descriptors(&mut file, &sb)?;

        Ok(Ext2Volume { file, sb, groups })
    }

    fn load_group_descriptors(
        file: &mut File,
        sb: &Superblock,
    ) -> Result<Vec<GroupDescriptor>, VolioError> {
        let group_count = sb.group_count();
        let desc_size = sb.desc_size as u64;
        let per_block = sb.block_size() / desc_size;
        let gdt_start = sb.gdt_start_block();

        let mut groups = Vec::with_capacity(group_count as usize);
        let mut blk_buf = vec![0u8; sb.block_size() as usize];
        let mut loaded_block: Option<u64> = None;

        for group_id in 0..group_count as u64 {
            let desc_blk = gdt_start + group_id / per_block;
            let idx_in_blk = (group_id % per_block) as usize;

            if loaded_block != Some(desc_blk) {
                read_block_raw(file, desc_blk, sb.block_size(), &mut blk_buf)?;
                loaded_block = Some(desc_blk);
            }

            let off = idx_in_blk * desc_size as usize;
            let desc_bytes = &blk_buf[off..off + desc_size as usize];
            groups.push(GroupDescriptor::parse(desc_bytes, sb));
        }

        Ok(groups)
    }

    fn read_block(&mut self, blk: u64) -> Result<Vec<u8>, VolioError> {
        let mut buf = vec![0u8; self.sb.block_size() as usize];
        read_block_raw(&mut self.file, blk, self.sb.block_size(), &mut buf)?;
        Ok(buf)
    }

    fn read_inode_raw(&mut self, ino: u32) -> Result<RawInode, VolioError> {
        if ino == 0 || ino > self.sb.inodes_count {
            return Err(VolioError::BadInode(ino));
        }
        let idx = ino - 1;
        let group = idx / self.sb.inodes_per_group;
        let idx_in_group = idx % self.sb.inodes_per_group;

        let descriptor = self
        .groups
        .get(group as usize)
        .ok_or(VolioError::BadGroupDescriptor(group))?;

        let inode_size = self.sb.inode_size as u64;
        let byte_offset = idx_in_group as u64 * inode_size;
        let blk_offset = byte_offset / self.sb.block_size();
        let byte_in_blk = (byte_offset % self.sb.block_size()) as usize;

        let blk = self.read_block(descriptor.inode_table_block + blk_offset)?;
        let end = byte_in_blk + inode_size as usize;
        if end > blk.len() {
            return Err(VolioError::BadInode(ino));
        }
        Ok(RawInode::parse(&blk[byte_in_blk..end]))
    }

    /// Concatenates a directory inode's data blocks, in logical order, into
    /// one buffer `iterate_dir` decodes raw entries from. Dispatches on
    /// extents vs. the classic block map per `RawInode::uses_extents`.
    fn read_directory_data(&mut self, ino: u32, raw: &RawInode) -> Result<Vec<u8>, VolioError> {
        let block_size = self.sb.block_size();
        let blocks = if raw.uses_extents() {
            let mut reader = |blk: u64| self.read_block(blk);
            extent::extent_tree_blocks(&raw.block, ino, &mut reader)?
        } else {
            let pointers = raw.block_pointers();
            let mut reader = |blk: u64| self.read_block(blk);
            extent::classic_blocks(&pointers, block_size, &mut reader)?
        };

        if blocks.is_empty() {
            return Err(VolioError::EmptyDirectory(ino));
        }

        let mut data = Vec::with_capacity(blocks.len() * block_size as usize);
        for blk in blocks {
            data.extend(self.read_block(blk)?);
        }
        let size = raw.size as usize;
        if size > 0 && size < data.len() {
            data.truncate(size);
        }
        Ok(data)
    }
}

fn read_block_raw(file: &mut File, blk: u64, block_size: u64, buf: &mut [u8]) -> Result<(), VolioError> {
    file.seek(SeekFrom::Start(blk * block_size))?;
    file.read_exact(buf)?;
    Ok(())
}

/// Sequential scan over every inode slot, terminated by running past
/// `inode_count`. Rust's `Iterator::next` returning `None` already signals
/// end-of-scan, so there is no need for the `ino == 0` sentinel item the
/// underlying C iteration protocol uses.
struct InodeScan<'a> {
    volume: &'a mut Ext2Volume,
    next: u32,
    last: u32,
}

impl Iterator for InodeScan<'_> {
    type Item = Result<ScannedInode, VolumeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.last {
            return None;
        }
        let ino = self.next;
        self.next += 1;

        match self.volume.read_inode_raw(ino) {
            Ok(raw) => Some(Ok(ScannedInode {
                        ino,
                        is_dir: raw.is_dir(),
                        links_count: raw.links_count,
                        mtime: raw.mtime,
                        ctime: raw.ctime,
                    })),
            Err(err) => Some(Err(VolumeError::PerInode {
                        ino,
                        source: err.to_string(),
                    })),
        }
    }
}

impl VolumeReader for Ext2Volume {
    fn inode_count(&self) -> u32 {
        self.sb.inodes_count
    }

    fn first_usable_inode(&self) -> u32 {
        self.sb.first_ino
    }

    fn scan_inodes(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = Result<ScannedInode, VolumeError>> + '_>, VolumeError> {
        let last = self.sb.inodes_count;
        Ok(Box::new(InodeScan {
                    volume: self,
                    next: 1,
                    last,
                }))
    }

    fn iterate_dir(
        &mut self,
        dir_ino: u32,
        visit: &mut dyn FnMut(u32, &[u8]) -> DirIterControl,
    ) -> Result<(), VolumeError> {
        let raw = self
        .read_inode_raw(dir_ino)
        .map_err(|err| VolumeError::DirIteration {
                ino: dir_ino,
                source: err.to_string(),
            })?;

        let data = self
        .read_directory_data(dir_ino, &raw)
        .map_err(|err| VolumeError::DirIteration {
                ino: dir_ino,
                source: err.to_string(),
            })?;

        for entry in dir::iter_entries(&data) {
            if visit(entry.inode, entry.name) == DirIterControl::Stop {
                break;
            }
        }
        Ok(())
    }
}

/// Opens `path` as a [`VolumeReader`], mapping a failure at mount time to
/// the `VolumeError::Open` variant the core's error chain expects.
pub fn open(path: &Path) -> Result<Ext2Volume, VolumeError> {
    Ext2Volume::open(path).map_err(volio_open)
}
