//! Turns the user's positional argument into an openable path.
//!
//! This is explicitly out of scope for `e2paths-core` — the scanner only
//! ever sees an already-open [`e2paths_core::VolumeReader`] — but the CLI
//! still needs to get from "a path the user typed" to "a device or image
//! `Ext2Volume::open` can read", the same `stat`/mountinfo dance
//! `e2find.c`'s `get_backing_file` performs.

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MountError {
    #[error("cannot stat {0}: {1}")]
    Stat(PathBuf, std::io::Error),

    #[error("cannot find the backing block device for {0}")]
    DeviceLookup(PathBuf),

    #[error("{0} is not the root of its filesystem")]
    NotAMountpoint(PathBuf),
}

/// Resolves `path` to a path `Ext2Volume::open` can read directly.
///
/// - If `as_image`, `path` is used as-is: it already names a regular file
///   holding a filesystem image.
/// - Otherwise, `path` is `stat`ed. A block device is used directly. A
///   directory or regular file on a mounted filesystem has its backing
///   device resolved by reading `st_dev` and cross-referencing
///   `/proc/self/mountinfo` for a mounted source whose own device number
///   matches.
pub fn resolve_device(path: &Path, as_image: bool) -> Result<PathBuf, MountError> {
    if as_image {
        return Ok(path.to_path_buf());
    }

    let meta = fs::metadata(path).map_err(|err| MountError::Stat(path.to_path_buf(), err))?;
    if meta.file_type().is_block_device() {
        return Ok(path.to_path_buf());
    }

    find_mount_source(meta.dev()).ok_or_else(|| MountError::DeviceLookup(path.to_path_buf()))
}

/// Checks that `path` names the root of its filesystem (inode 2 by ext2/3/4
/// convention), for `--mountpoint`.
pub fn verify_is_mountpoint(path: &Path) -> Result<(), MountError> {
    let meta = fs::metadata(path).map_err(|err| MountError::Stat(path.to_path_buf(), err))?;
    if meta.ino() == 2 {
        Ok(())
    } else {
        Err(MountError::NotAMountpoint(path.to_path_buf()))
    }
}

/// Scans `/proc/self/mountinfo` for a mount whose source device has the
/// same `st_rdev` as `target_dev`. Recomputing a `dev_t` from the
/// major:minor field `mountinfo` prints would require reimplementing
/// `makedev`'s bit layout; `stat`ing the candidate source path directly and
/// comparing its own device number sidesteps that entirely.
fn find_mount_source(target_dev: u64) -> Option<PathBuf> {
    let mountinfo = fs::read_to_string("/proc/self/mountinfo").ok()?;
    for line in mountinfo.lines() {
        let Some(source) = mountinfo_source_field(line) else {
            continue;
        };
        let candidate = Path::new(source);
        if let Ok(meta) = fs::metadata(candidate) {
            if meta.file_type().is_block_device() && meta.rdev() == target_dev {
                return Some(candidate.to_path_buf());
            }
        }
    }
    None
}

/// `mountinfo` lines look like:
/// `36 35 98:0 /mnt1 /mnt2 rw,noatime - ext3 /dev/root rw,errors=continue`
/// Everything before the ` - ` separator has a variable field count (optional
/// tags), but exactly one `fstype source super-options` triple always
/// follows it.
fn mountinfo_source_field(line: &str) -> Option<&str> {
    let (_, after_separator) = line.split_once(" - ")?;
    let mut fields = after_separator.split_whitespace();
    let _fstype = fields.next()?;
    fields.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_source_field_past_the_dash_separator() {
        let line = "36 35 98:0 /mnt1 /mnt2 rw,noatime - ext3 /dev/root rw,errors=continue";
        assert_eq!(mountinfo_source_field(line), Some("/dev/root"));
    }

    #[test]
    fn tolerates_extra_optional_tag_fields_before_the_separator() {
        let line = "36 35 98:0 /mnt1 /mnt2 rw shared:2 master:3 - ext4 /dev/sda1 rw";
        assert_eq!(mountinfo_source_field(line), Some("/dev/sda1"));
    }

    #[test]
    fn a_line_with_no_separator_yields_nothing() {
        assert_eq!(mountinfo_source_field("garbage line with no dash"), None);
    }

    #[test]
    fn as_image_skips_stat_entirely_and_returns_the_path_unchanged() {
        let resolved = resolve_device(Path::new("/does/not/exist.img"), true).unwrap();
        assert_eq!(resolved, PathBuf::from("/does/not/exist.img"));
    }

    #[test]
    fn resolve_device_on_a_missing_path_is_a_stat_error() {
        let err = resolve_device(Path::new("/does/not/exist"), false).unwrap_err();
        assert!(matches!(err, MountError::Stat(_, _)));
    }
}
