//! `e2paths`: wires `e2paths-volio`'s `Ext2Volume` into `e2paths-core`'s
//! `Scanner`/`Emitter` pair and translates the result into the documented
//! exit-code table.

mod args;
mod exit;
mod mount;

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use e2paths_core::{Emitter, PathResolver, Scanner, ScannerOptions, TimeMode, VolumeReader};
use e2paths_volio::Ext2Volume;
use log::debug;

use args::Args;
use exit::AppError;

fn main() -> ExitCode {
    args::handle_version_flag();
    let args: Args = argh::from_env();

    let log_level = if args.debug { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::new().filter_level(log_level).format_timestamp(None).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.code())
        }
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let path = std::path::Path::new(&args.path);

    if args.mountpoint && !args.image {
        mount::verify_is_mountpoint(path)?;
    }

    let device = mount::resolve_device(path, args.image)?;
    debug!("resolved {} to device/image {}", args.path, device.display());

    let after = args.after.as_deref().map(exit::parse_after).transpose()?;

    let mut volume = Ext2Volume::open(&device)
        .map_err(|err| AppError::FilesystemOpen(err.to_string()))?;
    debug!(
        "opened filesystem: {} inodes, first usable inode {}",
        volume.inode_count(),
        volume.first_usable_inode()
    );

    let columns = e2paths_core::inode_table::TimeColumns {
        mtime: args.show_mtime,
        ctime: args.show_ctime,
    };
    let options = ScannerOptions { columns, after };

    let scanner = Scanner::new(volume.inode_count(), volume.first_usable_inode(), options);
    let mut result = scanner.run(&mut volume)?;
    debug!(
        "scan complete: {} inodes, {} bytes of dirents",
        result.inode_table.len(),
        result.dirents.byte_size()
    );

    let time_mode = TimeMode::from_flags(args.show_mtime, args.show_ctime);
    let terminator = if args.print0 { 0 } else { b'\n' };
    let emitter = Emitter::new(time_mode, args.unique, terminator);
    let mut resolver = PathResolver::new();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    emitter.emit(&mut out, &mut resolver, &result.inode_table, &result.dirents, &mut result.selected)?;
    out.flush()?;

    Ok(())
}
