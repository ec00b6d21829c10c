//! Reconstructs an absolute pathname from a fixed-up dirent by walking its
//! parent chain backward into a fixed-size buffer.
//!
//! The root dirent's parent offset points at itself after the fix-up pass,
//! so termination is keyed on the empty name stored for the root sentinel,
//! never on comparing offsets — comparing offsets would also have to
//! special-case the very record this resolver starts from.

use thiserror::Error;

use crate::dirent_store::{DirentStore, PostFixup};
use crate::{MAX_PATH_DEPTH, PATH_MAX};

/// Errors resolving a single path. Both are per-entry warnings at the
/// emitter: neither aborts the run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathResolveError {
    #[error("path exceeds PATH_MAX ({PATH_MAX} bytes)")]
    PathTooLong,

    #[error("parent chain exceeds {MAX_PATH_DEPTH} components")]
    TooDeep,
}

/// Walks [`DirentStore`] parent chains into a reusable [`PATH_MAX`] buffer.
///
/// The buffer is owned by the resolver rather than allocated per call, since
/// the emitter resolves one path per selected inode and a fresh `Vec`
/// per call would make the allocator the hot path (the "no
/// suspension points" single-threaded model already assumes one resolver
/// serving the whole emission pass).
pub struct PathResolver {
    buf: [u8; PATH_MAX],
}

impl PathResolver {
    pub fn new() -> Self {
        PathResolver { buf: [0u8; PATH_MAX] }
    }

    /// Resolves the absolute path of the dirent at `offset`, writing into
    /// the internal buffer and returning a borrow of the occupied range.
    pub fn resolve<'s>(
        &'s mut self,
        dirents: &DirentStore<PostFixup>,
        offset: u32,
    ) -> Result<&'s [u8], PathResolveError> {
        let mut pos = PATH_MAX;
        pos -= 1;
        self.buf[pos] = 0;

        let mut cursor = offset;
        let mut i = 0usize;

        loop {
            let dirent = dirents.get(cursor);
            let is_root = dirent.is_root();

            if i > 0 || is_root {
                if pos == 0 {
                    return Err(PathResolveError::PathTooLong);
                }
                pos -= 1;
                self.buf[pos] = b'/';
            }

            if i > MAX_PATH_DEPTH {
                return Err(PathResolveError::TooDeep);
            }

            if is_root {
                break;
            }

            let name = dirent.name;
            if pos < name.len() {
                return Err(PathResolveError::PathTooLong);
            }
            pos -= name.len();
            self.buf[pos..pos + name.len()].copy_from_slice(name);

            cursor = dirent.parent_offset;
            i += 1;
        }

        self.buf.copy_within(pos..PATH_MAX, 0);
        let len = PATH_MAX - pos;
        Ok(&self.buf[..len])
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirent_store::{DirentStore, PreFixup};
    use crate::inode_table::{InodeTable, TimeColumns};

    /// Builds a fixed-up store for `/home/alice` and returns
    /// `(store, root_offset, home_offset, alice_offset)`.
    fn home_alice_tree() -> (DirentStore<PostFixup>, u32, u32, u32) {
        let mut store = DirentStore::<PreFixup>::new();
        let root_off = store.append(0, 0, b"").unwrap();

        let mut table = InodeTable::new(TimeColumns::default());
        let root_idx = table.push(2, None, None).unwrap();
        table.set_dirent_offset(root_idx, root_off);
        let home_idx = table.push(12, None, None).unwrap();
        let alice_idx = table.push(13, None, None).unwrap();

        let home_off = store.append(home_idx as u32, root_idx as u32, b"home").unwrap();
        table.set_dirent_offset(home_idx, home_off);
        let alice_off = store
        .append(alice_idx as u32, home_idx as u32, b"alice")
        .unwrap();
        table.set_dirent_offset(alice_idx, alice_off);

        let fixed = store.fixup(&table).unwrap();
        (fixed, root_off, home_off, alice_off)
    }

    #[test]
    fn resolves_the_root_as_a_single_slash() {
        let (store, root_off, _, _) = home_alice_tree();
        let mut resolver = PathResolver::new();
        let path = resolver.resolve(&store, root_off).unwrap();
        assert_eq!(path, b"/");
    }

    #[test]
    fn resolves_a_nested_path_from_the_leaf_upward() {
        let (store, _, _, alice_off) = home_alice_tree();
        let mut resolver = PathResolver::new();
        let path = resolver.resolve(&store, alice_off).unwrap();
        assert_eq!(path, b"/home/alice");
    }

    #[test]
    fn resolves_an_intermediate_directory() {
        let (store, _, home_off, _) = home_alice_tree();
        let mut resolver = PathResolver::new();
        let path = resolver.resolve(&store, home_off).unwrap();
        assert_eq!(path, b"/home");
    }

    #[test]
    fn a_chain_past_the_depth_cap_is_too_deep() {
        let mut store = DirentStore::<PreFixup>::new();
        let root_off = store.append(0, 0, b"").unwrap();

        let mut table = InodeTable::new(TimeColumns::default());
        let root_idx = table.push(2, None, None).unwrap();
        table.set_dirent_offset(root_idx, root_off);

        let mut parent_idx = root_idx;
        let mut last_off = root_off;
        for depth in 0..(MAX_PATH_DEPTH + 5) {
            let ino = 100 + depth as u32;
            let idx = table.push(ino, None, None).unwrap();
            let off = store
            .append(idx as u32, parent_idx as u32, b"d")
            .unwrap();
            table.set_dirent_offset(idx, off);
            parent_idx = idx;
            last_off = off;
        }

        let fixed = store.fixup(&table).unwrap();
        let mut resolver = PathResolver::new();
        assert_eq!(
            resolver.resolve(&fixed, last_off),
            Err(PathResolveError::TooDeep)
        );
    }

    #[test]
    fn a_name_longer_than_the_remaining_buffer_is_too_long() {
        let mut store = DirentStore::<PreFixup>::new();
        let root_off = store.append(0, 0, b"").unwrap();

        let mut table = InodeTable::new(TimeColumns::default());
        let root_idx = table.push(2, None, None).unwrap();
        table.set_dirent_offset(root_idx, root_off);
        let child_idx = table.push(50, None, None).unwrap();

        let huge_name = vec![b'x'; PATH_MAX];
        let child_off = store
        .append(child_idx as u32, root_idx as u32, &huge_name)
        .unwrap();
        table.set_dirent_offset(child_idx, child_off);

        let fixed = store.fixup(&table).unwrap();
        let mut resolver = PathResolver::new();
        assert_eq!(
            resolver.resolve(&fixed, child_off),
            Err(PathResolveError::PathTooLong)
        );
    }
}
