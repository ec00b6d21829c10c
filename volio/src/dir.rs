//! Decodes the flat byte stream of a directory's data blocks into entries.
//!
//! The wire format follows `fs/ext4/dir.rs::Ext4Directory::next`: a 4-byte
//! little-endian inode number, a 2-byte `rec_len`, a 1-byte `name_len`, a
//! 1-byte file-type tag (only meaningful under the `filetype` feature), and
//! then `name_len` bytes of name with no terminator — the record's real end
//! is `rec_len`, which pads out to the end of its directory block for the
//! last entry in that block.
//!
//! One deliberate deviation from the reference driver: `Ext4Directory::next`
//! stops the whole iteration the moment it meets an entry with inode number
//! 0. That is fine for a bootloader reading a handful of well-known paths,
//! but a production directory routinely has *interior* deleted entries
//! (inode 0, nonzero `rec_len`) with live entries still following them in
//! the same block. This scanner needs every live entry, so a zero-inode
//! record here is skipped rather than treated as end-of-directory; only
//! running off the end of the buffer or an unparseable `rec_len` of 0
//! stops the walk.

pub struct DirEntry<'a> {
    pub inode: u32,
    pub name: &'a [u8],
}

/// Iterates the decoded entries of a directory's concatenated data blocks.
pub fn iter_entries(data: &[u8]) -> impl Iterator<Item = DirEntry<'_>> {
    let mut cursor = 0usize;
    std::iter::from_fn(move || loop {
            if cursor + 8 > data.len() {
                return None;
            }
            let inode = u32::from_le_bytes(data[cursor..cursor + 4].try_into().unwrap());
            let rec_len = u16::from_le_bytes(data[cursor + 4..cursor + 6].try_into().unwrap()) as usize;
            let name_len = data[cursor + 6] as usize;

            if rec_len == 0 || cursor + rec_len > data.len() {
                return None;
            }
            let name_start = cursor + 8;
            let name_end = name_start + name_len;
            if name_end > data.len() {
                return None;
            }

            cursor += rec_len;

            if inode == 0 {
                continue;
            }
            return Some(DirEntry {
                    inode,
                    name: &data[name_start..name_end],
                });
        })
}
