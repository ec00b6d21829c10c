//! Append-only byte buffer with amortized O(1) append.
//!
//! [`InodeTable`](crate::inode_table::InodeTable) and
//! [`DirentStore`](crate::dirent_store::DirentStore) are both built on top
//! of a `PackedVector`: a raw `Vec<u8>` plus a growth policy tuned for the
//! scanner's access pattern (append-only, never shrinks, can reach a few
//! hundred million records).

use crate::error::CoreError;

/// Capacity doubles (geometrically) up to this many bytes, then grows
/// linearly by the same increment. Keeps per-allocation overhead low for
/// small filesystems while bounding the over-allocation a naive doubling
/// strategy would otherwise waste once the buffer reaches gigabyte scale.
const GROWTH_CEILING: usize = 1024 * 1024;

/// Initial capacity of a freshly constructed `PackedVector`.
const INITIAL_CAPACITY: usize = 64 * 1024;

/// A growable, append-only byte buffer.
pub struct PackedVector {
    data: Vec<u8>,
}

impl PackedVector {
    /// Creates an empty buffer with the default initial capacity.
    pub fn new() -> Self {
        PackedVector {
            data: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Number of bytes appended so far.
    pub fn used(&self) -> usize {
        self.data.len()
    }

    /// Bytes currently reserved (not necessarily all used).
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Appends `bytes`, growing the backing allocation first if needed.
    ///
    /// Returns the byte offset at which `bytes` now begins.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize, CoreError> {
        self.reserve(bytes.len())?;
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Ensures at least `additional` more bytes can be appended without a
    /// further grow, following the geometric-then-linear policy described
    /// on [`GROWTH_CEILING`].
    fn reserve(&mut self, additional: usize) -> Result<(), CoreError> {
        let required = self.data.len() + additional;
        if required <= self.data.capacity() {
            return Ok(());
        }

        let mut new_capacity = self.data.capacity().max(1);
        while new_capacity < required {
            let delta = new_capacity.min(GROWTH_CEILING);
            new_capacity = new_capacity
            .checked_add(delta)
            .ok_or(CoreError::OutOfMemory)?;
        }

        let extra = new_capacity - self.data.capacity();
        self.data.try_reserve(extra).map_err(|_| CoreError::OutOfMemory)?;
        Ok(())
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Overwrites `len` bytes starting at `offset` with `bytes`.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Direct access to the whole backing buffer, for linear scans.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for PackedVector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_the_offset_before_the_write() {
        let mut pv = PackedVector::new();
        let off1 = pv.append(&[1, 2, 3]).unwrap();
        let off2 = pv.append(&[4, 5]).unwrap();
        assert_eq!(off1, 0);
        assert_eq!(off2, 3);
        assert_eq!(pv.slice(0, 3), &[1, 2, 3]);
        assert_eq!(pv.slice(3, 2), &[4, 5]);
    }

    #[test]
    fn write_at_overwrites_in_place_without_growing() {
        let mut pv = PackedVector::new();
        pv.append(&[0, 0, 0, 0]).unwrap();
        pv.write_at(0, &[9, 9]);
        assert_eq!(pv.slice(0, 4), &[9, 9, 0, 0]);
        assert_eq!(pv.used(), 4);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut pv = PackedVector::new();
        let chunk = vec![0xAB; INITIAL_CAPACITY];
        pv.append(&chunk).unwrap();
        pv.append(&[1, 2, 3, 4]).unwrap();
        assert_eq!(pv.used(), INITIAL_CAPACITY + 4);
        assert!(pv.capacity() >= pv.used());
    }

    #[test]
    fn growth_past_ceiling_is_linear() {
        let mut pv = PackedVector::new();
        // Push capacity well past the 1 MiB ceiling, then record how much
        // headroom a single further grow buys us.
        pv.append(&vec![0u8; GROWTH_CEILING * 3]).unwrap();
        let cap_before = pv.capacity();
        pv.append(&vec![0u8; 1]).unwrap();
        let grown_by = pv.capacity().saturating_sub(cap_before);
        // Either no regrow was needed, or the regrow added at most one
        // ceiling's worth of capacity (linear, not another doubling).
        assert!(grown_by == 0 || grown_by <= GROWTH_CEILING);
    }
}
