//! Packed, variable-stride table of scanned inodes.
//!
//! Stores `{ ino, dirent_offset, time1?, time2? }` records in
//! ascending `ino` order inside a [`PackedVector`], with the record stride
//! fixed once at construction time depending on which timestamp columns
//! were requested. A native `Vec<InodeRecord>` of the widest variant would
//! waste 4 or 8 bytes per record on volumes where timestamps aren't
//! requested at all — at 10^8 inodes that is hundreds of megabytes, so the
//! stride is chosen up front and every accessor derives its field offsets
//! from it.

use crate::error::CoreError;
use crate::packed_vector::PackedVector;

/// Which optional timestamp columns an [`InodeTable`] was built to carry.
///
/// Fixes the record stride: 8 bytes with neither, 12 with one, 16 with
/// both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeColumns {
    pub mtime: bool,
    pub ctime: bool,
}

impl TimeColumns {
    fn stride(self) -> usize {
        8 + if self.mtime { 4 } else { 0 } + if self.ctime { 4 } else { 0 }
    }
}

/// One decoded record: the inode number, the byte offset of its canonical
/// dirent inside [`DirentStore`](crate::dirent_store::DirentStore) (`0`
/// until pass 2 fills it in), and whichever of `mtime`/`ctime` this table
/// was configured to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InodeRecord {
    pub ino: u32,
    pub dirent_offset: u32,
    pub mtime: Option<u32>,
    pub ctime: Option<u32>,
}

/// Packed, append-only, `ino`-sorted table of every used inode.
pub struct InodeTable {
    storage: PackedVector,
    columns: TimeColumns,
    stride: usize,
    count: usize,
}

impl InodeTable {
    pub fn new(columns: TimeColumns) -> Self {
        InodeTable {
            storage: PackedVector::new(),
            columns,
            stride: columns.stride(),
            count: 0,
        }
    }

    pub fn columns(&self) -> TimeColumns {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Appends a record for `ino`, recording `dirent_offset` as `0` (pass 2
    /// fills in the real value the first time it sees a dirent naming this
    /// inode). Callers must append in ascending `ino` order — the
    /// inode-table iterator already produces records this way, so this is
    /// never checked here.
    pub fn push(&mut self, ino: u32, mtime: Option<u32>, ctime: Option<u32>) -> Result<usize, CoreError> {
        let mut record = [0u8; 16];
        record[0..4].copy_from_slice(&ino.to_le_bytes());
        record[4..8].copy_from_slice(&0u32.to_le_bytes());
        let mut pos = 8;
        if self.columns.mtime {
            record[pos..pos + 4].copy_from_slice(&mtime.unwrap_or(0).to_le_bytes());
            pos += 4;
        }
        if self.columns.ctime {
            record[pos..pos + 4].copy_from_slice(&ctime.unwrap_or(0).to_le_bytes());
            pos += 4;
        }
        self.storage.append(&record[..pos])?;
        let index = self.count;
        self.count += 1;
        Ok(index)
    }

    /// Decodes the record at `index`.
    pub fn get(&self, index: usize) -> InodeRecord {
        let bytes = self.storage.slice(index * self.stride, self.stride);
        let ino = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let dirent_offset = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let mut pos = 8;
        let mtime = self.columns.mtime.then(|| {
                let v = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
                pos += 4;
                v
            });
        let ctime = self
        .columns
        .ctime
        .then(|| u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()));
        InodeRecord {
            ino,
            dirent_offset,
            mtime,
            ctime,
        }
    }

    /// Just the `ino` field, without decoding timestamps — the hot path for
    /// [`lookup`](Self::lookup)'s bisection.
    fn ino_at(&self, index: usize) -> u32 {
        let bytes = self.storage.slice(index * self.stride, 4);
        u32::from_le_bytes(bytes.try_into().unwrap())
    }

    /// Overwrites the `dirent_offset` field of the record at `index`. Called
    /// by pass 2 the first time a dirent names this inode:
    /// later hardlink dirents for the same inode do not overwrite it again.
    pub fn set_dirent_offset(&mut self, index: usize, offset: u32) {
        let at = index * self.stride + 4;
        self.storage.write_at(at, &offset.to_le_bytes());
    }

    /// Finds the table index of `ino` by interpolation-assisted bisection
    /// over the known-sorted stride.
    ///
    /// A miss is a fatal programming error: every inode looked up here was
    /// supposed to have been recorded by pass 1.
    pub fn lookup(&self, ino: u32) -> Result<usize, CoreError> {
        let count = self.count;
        if count == 0 {
            return Err(CoreError::InodeLookupMiss(ino));
        }

        let mut index = count;
        let mut half = count;
        let mut current: Option<u32> = None;

        while half > 1 {
            half /= 2;
            match current {
                Some(cur) if cur < ino => index += half,
                _ => index -= half,
            }
            let at = self.ino_at(index);
            current = Some(at);
            if at == ino {
                return Ok(index);
            }
        }

        // Linear walk phase: with fewer than two elements the bisection
        // loop above never ran, so we start from index - 1 and walk
        // forward, matching the stated landing point.
        let (mut i, step): (isize, isize) = if count < 2 {
            (-1, 1)
        } else if current.map(|c| c < ino).unwrap_or(true) {
            (index as isize, 1)
        } else {
            (index as isize, -1)
        };

        loop {
            i += step;
            if i < 0 || i as usize >= count {
                return Err(CoreError::InodeLookupMiss(ino));
            }
            let at = self.ino_at(i as usize);
            if at == ino {
                return Ok(i as usize);
            }
            // Passed the target without finding it.
            if (step > 0 && at > ino) || (step < 0 && at < ino) {
                return Err(CoreError::InodeLookupMiss(ino));
            }
        }
    }

    /// Iterates records in table order (ascending `ino`).
    pub fn iter(&self) -> impl Iterator<Item = InodeRecord> + '_ {
        (0..self.count).map(move |i| self.get(i))
    }

    /// Bytes occupied by the backing storage, for diagnostics.
    pub fn byte_size(&self) -> usize {
        self.storage.used()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(inos: &[u32]) -> InodeTable {
        let mut table = InodeTable::new(TimeColumns { mtime: true, ctime: true });
        for &ino in inos {
            table.push(ino, Some(ino * 10), Some(ino * 100)).unwrap();
        }
        table
    }

    #[test]
    fn push_then_get_round_trips() {
        let table = build(&[2, 11, 12, 50, 99]);
        let rec = table.get(2);
        assert_eq!(rec.ino, 12);
        assert_eq!(rec.mtime, Some(120));
        assert_eq!(rec.ctime, Some(1200));
        assert_eq!(rec.dirent_offset, 0);
    }

    #[test]
    fn set_dirent_offset_overwrites_only_that_field() {
        let mut table = build(&[2, 11, 12]);
        table.set_dirent_offset(1, 4096);
        let rec = table.get(1);
        assert_eq!(rec.ino, 11);
        assert_eq!(rec.dirent_offset, 4096);
        assert_eq!(rec.mtime, Some(110));
    }

    #[test]
    fn lookup_finds_every_inode() {
        let inos = [2, 11, 12, 13, 50, 51, 99, 1000, 1001];
        let table = build(&inos);
        for (expected_idx, &ino) in inos.iter().enumerate() {
            assert_eq!(table.lookup(ino).unwrap(), expected_idx);
        }
    }

    #[test]
    fn lookup_miss_is_an_error() {
        let table = build(&[2, 11, 12, 50]);
        assert!(table.lookup(13).is_err());
        assert!(table.lookup(1).is_err());
        assert!(table.lookup(1000).is_err());
    }

    #[test]
    fn lookup_with_fewer_than_two_elements_uses_the_linear_walk() {
        let empty = InodeTable::new(TimeColumns::default());
        assert!(empty.lookup(2).is_err());

        let mut single = InodeTable::new(TimeColumns::default());
        single.push(2, None, None).unwrap();
        assert_eq!(single.lookup(2).unwrap(), 0);
        assert!(single.lookup(3).is_err());
    }

    #[test]
    fn stride_shrinks_without_timestamp_columns() {
        let mut table = InodeTable::new(TimeColumns::default());
        table.push(2, None, None).unwrap();
        table.push(11, None, None).unwrap();
        assert_eq!(table.byte_size(), 16);
        let rec = table.get(1);
        assert_eq!(rec.ino, 11);
        assert_eq!(rec.mtime, None);
        assert_eq!(rec.ctime, None);
    }
}
