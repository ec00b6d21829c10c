//! Formats and writes the final output stream.
//!
//! The emitter is the only component that touches all three scan products
//! at once: [`InodeTable`] (for the real inode number and timestamps behind
//! a dirent's table index, and for the `selected` bit), [`DirentStore`] (to
//! walk parent chains via [`PathResolver`]), and the `selected` bitfield
//! itself (cleared bit-by-bit under `--unique`).

use std::io::{self, Write};

use crate::dirent_store::{DirentStore, PostFixup};
use crate::inode_table::InodeTable;
use crate::path_resolver::PathResolver;
use crate::Bitfield;

/// Which timestamp columns prefix each output record — mtime comes first
/// when both are active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeMode {
    #[default]
    None,
    Mtime,
    Ctime,
    Both,
}

impl TimeMode {
    pub fn from_flags(show_mtime: bool, show_ctime: bool) -> Self {
        match (show_mtime, show_ctime) {
            (true, true) => TimeMode::Both,
            (true, false) => TimeMode::Mtime,
            (false, true) => TimeMode::Ctime,
            (false, false) => TimeMode::None,
        }
    }
}

/// Writes one formatted record per selected, resolvable dirent.
pub struct Emitter {
    time_mode: TimeMode,
    unique: bool,
    terminator: u8,
}

impl Emitter {
    /// `terminator` is `b'\n'` by default, `0` under `--print0`.
    pub fn new(time_mode: TimeMode, unique: bool, terminator: u8) -> Self {
        Emitter {
            time_mode,
            unique,
            terminator,
        }
    }

    /// Iterates `dirents` in stored order and writes every selected record
    /// to `out`. `selected` is taken `&mut` because `--unique` clears a
    /// child's bit the first time its dirent is emitted, so later hardlink
    /// dirents for the same inode are silently skipped.
    ///
    /// A path-resolution failure is a per-entry warning: it is
    /// logged and the loop continues rather than aborting the whole run.
    pub fn emit<W: Write>(
        &self,
        out: &mut W,
        resolver: &mut PathResolver,
        table: &InodeTable,
        dirents: &DirentStore<PostFixup>,
        selected: &mut Bitfield,
    ) -> io::Result<()> {
        for (offset, view) in dirents.iter() {
            let record = table.get(view.ino_idx as usize);
            let ino = record.ino as usize;
            if !selected.get(ino) {
                continue;
            }
            if self.unique {
                selected.clear(ino);
            }

            let path = match resolver.resolve(dirents, offset) {
                Ok(path) => path,
                Err(err) => {
                    log::warn!("skipping inode {}: {err}", record.ino);
                    continue;
                }
            };

            self.write_prefix(out, &record)?;
            out.write_all(path)?;
            out.write_all(&[self.terminator])?;
        }
        Ok(())
    }

    fn write_prefix<W: Write>(
        &self,
        out: &mut W,
        record: &crate::inode_table::InodeRecord,
    ) -> io::Result<()> {
        match self.time_mode {
            TimeMode::None => {}
            TimeMode::Mtime => write!(out, "{:>10} ", record.mtime.unwrap_or(0))?,
            TimeMode::Ctime => write!(out, "{:>10} ", record.ctime.unwrap_or(0))?,
            TimeMode::Both => write!(
                out,
                "{:>10} {:>10} ",
                record.mtime.unwrap_or(0),
                record.ctime.unwrap_or(0)
            )?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirent_store::PreFixup;
    use crate::inode_table::TimeColumns;

    fn small_tree(columns: TimeColumns) -> (InodeTable, DirentStore<PostFixup>, Bitfield) {
        let mut table = InodeTable::new(columns);
        let mut store = DirentStore::<PreFixup>::new();

        let root_idx = table.push(2, Some(1000), Some(1000)).unwrap();
        let root_off = store.append(root_idx as u32, 0, b"").unwrap();
        table.set_dirent_offset(root_idx, root_off);

        let a_idx = table.push(14, Some(1700000000), Some(1700000123)).unwrap();
        let a_off = store.append(a_idx as u32, root_idx as u32, b"a").unwrap();
        table.set_dirent_offset(a_idx, a_off);
        store.append(a_idx as u32, root_idx as u32, b"b_hardlink_of_a").unwrap();

        let mut selected = Bitfield::new(20);
        selected.fill(true);

        let fixed = store.fixup(&table).unwrap();
        (table, fixed, selected)
    }

    #[test]
    fn default_mode_emits_every_dirent_with_a_newline_terminator() {
        let (table, dirents, mut selected) = small_tree(TimeColumns::default());
        let emitter = Emitter::new(TimeMode::None, false, b'\n');
        let mut resolver = PathResolver::new();
        let mut out = Vec::new();
        emitter
        .emit(&mut out, &mut resolver, &table, &dirents, &mut selected)
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["/", "/a", "/b_hardlink_of_a"]);
    }

    #[test]
    fn unique_emits_only_one_hardlink_name() {
        let (table, dirents, mut selected) = small_tree(TimeColumns::default());
        let emitter = Emitter::new(TimeMode::None, true, b'\n');
        let mut resolver = PathResolver::new();
        let mut out = Vec::new();
        emitter
        .emit(&mut out, &mut resolver, &table, &dirents, &mut selected)
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"/"));
        assert!(lines[1] == "/a" || lines[1] == "/b_hardlink_of_a");
    }

    #[test]
    fn both_timestamps_are_right_aligned_mtime_first() {
        let columns = TimeColumns { mtime: true, ctime: true };
        let (table, dirents, mut selected) = small_tree(columns);
        let emitter = Emitter::new(TimeMode::Both, false, b'\n');
        let mut resolver = PathResolver::new();
        let mut out = Vec::new();
        emitter
        .emit(&mut out, &mut resolver, &table, &dirents, &mut selected)
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let a_line = text.lines().find(|l| l.ends_with("/a")).unwrap();
        assert_eq!(a_line, "1700000000 1700000123 /a");
    }

    #[test]
    fn print0_terminates_records_with_nul() {
        let (table, dirents, mut selected) = small_tree(TimeColumns::default());
        let emitter = Emitter::new(TimeMode::None, false, 0);
        let mut resolver = PathResolver::new();
        let mut out = Vec::new();
        emitter
        .emit(&mut out, &mut resolver, &table, &dirents, &mut selected)
        .unwrap();

        assert!(out.contains(&0));
        assert!(!out.contains(&b'\n'));
    }

    #[test]
    fn unselected_inodes_are_skipped() {
        let (table, dirents, mut selected) = small_tree(TimeColumns::default());
        selected.clear(14);
        let emitter = Emitter::new(TimeMode::None, false, b'\n');
        let mut resolver = PathResolver::new();
        let mut out = Vec::new();
        emitter
        .emit(&mut out, &mut resolver, &table, &dirents, &mut selected)
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "/\n");
    }
}
