//! Maps every fatal error this binary can produce to one exit code.
//!
//! Keeping the table in one place is the point: `e2paths-core` and
//! `e2paths-volio` stay free of process-exit concerns (they return
//! ordinary `Result`s), and this is the only module that knows what each
//! number means on the way out.

use e2paths_core::{CoreError, VolumeError};
use thiserror::Error;

use crate::mount::MountError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Mount(#[from] MountError),

    #[error("invalid --after value {0:?}: must be a non-negative integer")]
    BadAfterValue(String),

    #[error("failed to open filesystem: {0}")]
    FilesystemOpen(String),

    #[error(transparent)]
    Scan(#[from] CoreError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The process exit code for this error, per the tool's documented
    /// exit-code table.
    pub fn code(&self) -> u8 {
        match self {
            AppError::Mount(MountError::Stat(..)) => 3,
            AppError::Mount(MountError::DeviceLookup(..)) => 4,
            AppError::Mount(MountError::NotAMountpoint(..)) => 9,
            AppError::BadAfterValue(_) => 11,
            AppError::FilesystemOpen(_) => 5,
            AppError::Scan(CoreError::Volume(VolumeError::Open(_))) => 5,
            AppError::Scan(CoreError::Volume(VolumeError::ScanOpen(_))) => 7,
            AppError::Scan(CoreError::Volume(VolumeError::DirIteration { .. })) => 8,
            AppError::Scan(CoreError::Volume(VolumeError::PerInode { .. })) => 10,
            AppError::Scan(CoreError::InodeLookupMiss(_)) => 10,
            AppError::Scan(CoreError::OutOfMemory) => 6,
            AppError::Io(_) => 2,
        }
    }
}

/// Parses `--after`'s value, producing the exit-11 error on anything that
/// isn't a plain non-negative integer.
pub fn parse_after(raw: &str) -> Result<u32, AppError> {
    raw.parse::<u32>()
        .map_err(|_| AppError::BadAfterValue(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_after_accepts_a_plain_integer() {
        assert_eq!(parse_after("1700000000").unwrap(), 1_700_000_000);
    }

    #[test]
    fn parse_after_rejects_negative_and_non_numeric_values() {
        assert!(matches!(parse_after("-5"), Err(AppError::BadAfterValue(_))));
        assert!(matches!(parse_after("soon"), Err(AppError::BadAfterValue(_))));
        assert!(matches!(parse_after(""), Err(AppError::BadAfterValue(_))));
    }

    #[test]
    fn exit_codes_match_the_documented_table() {
        assert_eq!(AppError::BadAfterValue("x".into()).code(), 11);
        assert_eq!(AppError::FilesystemOpen("x".into()).code(), 5);
        assert_eq!(
            AppError::Scan(CoreError::Volume(VolumeError::ScanOpen("x".into()))).code(),
            7
        );
        assert_eq!(
            AppError::Scan(CoreError::Volume(VolumeError::DirIteration {
                ino: 1,
                source: "x".into(),
            }))
            .code(),
            8
        );
        assert_eq!(AppError::Scan(CoreError::OutOfMemory).code(), 6);
    }
}
