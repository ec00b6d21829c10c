//! Orchestrates the two inode-table passes and the parent-reference
//! fix-up.
//!
//! A [`Scanner`] owns every packed buffer for the lifetime of one run:
//! construct, run pass 1, run pass 2 (which folds the fix-up pass in, since
//! nothing outside this module ever needs the pre-fix-up
//! [`DirentStore<PreFixup>`](crate::dirent_store::PreFixup) state), then
//! hand the result to a [`PathResolver`](crate::path_resolver::PathResolver)
//! and [`Emitter`](crate::emitter::Emitter). There is no cross-run state and
//! no process-level singleton.

use log::{debug, warn};

use crate::bitfield::Bitfield;
use crate::dirent_store::{DirentStore, PostFixup, PreFixup};
use crate::error::CoreError;
use crate::inode_table::{InodeTable, TimeColumns};
use crate::volume::{DirIterControl, VolumeReader};
use crate::ROOT_INO;

/// Selection/output options that affect what pass 1 and pass 2 record.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScannerOptions {
    pub columns: TimeColumns,
    /// `--after T`: only select inodes with `mtime >= T || ctime >= T`
    ///. `None` selects every used inode.
    pub after: Option<u32>,
}

/// Everything downstream stages (path resolution, emission) need after a
/// scan completes.
pub struct ScanResult {
    pub inode_table: InodeTable,
    pub dirents: DirentStore<PostFixup>,
    pub selected: Bitfield,
}

pub struct Scanner {
    inode_count: u32,
    first_usable: u32,
    options: ScannerOptions,
}

impl Scanner {
    pub fn new(inode_count: u32, first_usable: u32, options: ScannerOptions) -> Self {
        Scanner {
            inode_count,
            first_usable,
            options,
        }
    }

    /// Runs pass 1, pass 2, and the fix-up pass against `volume`, in that
    /// order: pass 1 completes fully before pass 2 begins, and pass 2
    /// completes fully before the fix-up pass.
    pub fn run<V: VolumeReader>(&self, volume: &mut V) -> Result<ScanResult, CoreError> {
        let (mut inode_table, is_dir, selected) = self.pass1(volume)?;
        let (pre_fixup, has_dirent) = self.pass2(volume, &mut inode_table, &is_dir)?;
        debug!(
            "pass 2 complete: {} bytes of dirents",
            pre_fixup.used()
        );
        self.warn_unreachable(&inode_table, &has_dirent);
        let dirents = pre_fixup.fixup(&inode_table)?;
        Ok(ScanResult {
                inode_table,
                dirents,
                selected,
            })
    }

    /// Per §3's invariant: every used, linked, non-reserved inode is
    /// expected to have at least one dirent. An inode pass 2 never saw in
    /// any directory is unreachable from the root; this is a per-inode
    /// warning, not a failure, matching the other recoverable categories
    /// in §7.
    fn warn_unreachable(&self, table: &InodeTable, has_dirent: &Bitfield) {
        for record in table.iter() {
            if !has_dirent.get(record.ino as usize) {
                warn!("inode {} is unreachable (no directory entry found)", record.ino);
            }
        }
    }

    /// Pass 1: scans the inode table, recording every used
    /// inode and marking `is_dir`/`selected` bitfields.
    fn pass1<V: VolumeReader>(
        &self,
        volume: &mut V,
    ) -> Result<(InodeTable, Bitfield, Bitfield), CoreError> {
        let mut table = InodeTable::new(self.options.columns);
        let mut is_dir = Bitfield::new(self.inode_count as usize + 1);
        let mut selected = Bitfield::new(self.inode_count as usize + 1);
        if self.options.after.is_none() {
            selected.fill(true);
        }

        let mut scanned = 0u64;
        for item in volume.scan_inodes()? {
            let scanned_inode = match item {
                Ok(inode) => inode,
                Err(err) => {
                    warn!("inode scan error, skipping: {err}");
                    continue;
                }
            };

            let ino = scanned_inode.ino;
            if ino == 0 {
                break;
            }
            if (ino < self.first_usable && ino != ROOT_INO) || scanned_inode.links_count == 0 {
                continue;
            }

            if scanned_inode.is_dir {
                is_dir.set(ino as usize);
            }

            if let Some(threshold) = self.options.after {
                if scanned_inode.mtime >= threshold || scanned_inode.ctime >= threshold {
                    selected.set(ino as usize);
                }
            }

            let mtime = self.options.columns.mtime.then_some(scanned_inode.mtime);
            let ctime = self.options.columns.ctime.then_some(scanned_inode.ctime);
            table.push(ino, mtime, ctime)?;
            scanned += 1;
        }

        debug!("pass 1 complete: {scanned} used inodes recorded");
        Ok((table, is_dir, selected))
    }

    /// Pass 2: for every directory inode recorded by pass 1,
    /// iterates its entries and appends a dirent for each child. Returns
    /// the built dirent store alongside a bitfield recording which inodes
    /// received at least one dirent, so [`Scanner::warn_unreachable`] does
    /// not have to infer "never visited" from the `dirent_offset == 0`
    /// sentinel, which root's own entry also legitimately produces.
    fn pass2<V: VolumeReader>(
        &self,
        volume: &mut V,
        table: &mut InodeTable,
        is_dir: &Bitfield,
    ) -> Result<(DirentStore<PreFixup>, Bitfield), CoreError> {
        let mut dirents = DirentStore::<PreFixup>::new();
        let mut has_dirent = Bitfield::new(self.inode_count as usize + 1);

        for dir_table_idx in 0..table.len() {
            let dir_record = table.get(dir_table_idx);
            if !is_dir.get(dir_record.ino as usize) {
                continue;
            }
            let dir_ino = dir_record.ino;

            let mut visit_err: Option<CoreError> = None;
            let visit_result = volume.iterate_dir(dir_ino, &mut |child_ino, name| {
                    if child_ino == dir_ino && child_ino != ROOT_INO {
                        // The `.` self-entry of a non-root directory; root's
                        // `.` is the one case that must survive, since it is
                        // what gives the root its own dirent.
                        return DirIterControl::Continue;
                    }
                    if name == b".." {
                        return DirIterControl::Continue;
                    }

                    let child_idx = match table.lookup(child_ino) {
                        Ok(idx) => idx,
                        Err(err) => {
                            visit_err = Some(err);
                            return DirIterControl::Stop;
                        }
                    };

                    let stored_name: &[u8] = if child_ino == dir_ino {
                        b""
                    } else {
                        name
                    };

                    let offset = match dirents.append(child_idx as u32, dir_table_idx as u32, stored_name) {
                        Ok(offset) => offset,
                        Err(err) => {
                            visit_err = Some(err);
                            return DirIterControl::Stop;
                        }
                    };

                    // Only the first-encountered dirent for an inode sets its
                    // `dirent_offset` (the "arbitrary canonical
                    // name" rule for hardlinks); later hardlinks to the same
                    // inode leave it alone. `has_dirent` tracks "ever set"
                    // explicitly rather than testing `dirent_offset == 0`,
                    // since offset `0` is also the legitimate, real offset of
                    // the root's own self-entry.
                    if !has_dirent.get(child_ino as usize) {
                        table.set_dirent_offset(child_idx, offset);
                        has_dirent.set(child_ino as usize);
                    }

                    DirIterControl::Continue
                });

            if let Some(err) = visit_err {
                return Err(err);
            }
            visit_result?;
        }

        Ok((dirents, has_dirent))
    }
}
