use argh::FromArgs;

#[derive(FromArgs)]
#[argh(description = "scan an ext2/3/4 volume and emit one pathname per reachable inode")]
pub struct Args {
    #[argh(switch, short = '0', description = "terminate each output record with NUL instead of newline")]
    pub print0: bool,

    #[argh(option, short = 'a', description = "only emit inodes with mtime >= T or ctime >= T (Unix epoch seconds)")]
    pub after: Option<String>,

    #[argh(switch, short = 'c', description = "prefix each line with ctime")]
    pub show_ctime: bool,

    #[argh(switch, short = 'm', description = "prefix each line with mtime")]
    pub show_mtime: bool,

    #[argh(switch, short = 'd', description = "enable progress diagnostics on stderr")]
    pub debug: bool,

    #[argh(switch, short = 'i', description = "interpret the path as a filesystem image file")]
    pub image: bool,

    #[argh(switch, short = 'p', description = "require the path to be the root of its filesystem")]
    pub mountpoint: bool,

    #[argh(switch, short = 'u', description = "emit at most one pathname per inode")]
    pub unique: bool,

    #[argh(positional, description = "a block device, a filesystem image, or any path on a mounted ext2/3/4 filesystem")]
    pub path: String,
}

/// `-v`/`--version` has no `argh` equivalent of `-h`/`--help`'s built-in
/// handling, so it is checked against the raw argv before `argh::from_env`
/// ever runs.
pub fn handle_version_flag() {
    let mut raw = std::env::args();
    raw.next(); // argv[0]
    if raw.any(|a| a == "-v" || a == "--version") {
        println!("e2paths {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }
}
