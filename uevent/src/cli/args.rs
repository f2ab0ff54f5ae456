//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;
use uevent_common::{DEFAULT_MODPROBE_PATH, DEFAULT_SYSFS_ROOT};

#[derive(Parser, Debug)]
#[command(
    name = "uevent",
    about = "Stream kernel uevents to a parent process as length-prefixed terms",
    after_help = "\
Frames are written to stdout. Any input on stdin, or stdin closing, stops the
program. Logs go to stderr (set RUST_LOG=debug for per-event output).

EXAMPLES:
    uevent                               Stream events, no module loading
    uevent --modprobe                    Also load modules for added devices"
)]
pub struct Args {
    /// Run the module loader for `add` events that carry a MODALIAS
    #[arg(long)]
    pub modprobe: bool,

    /// Module loader executable (invoked as `<PATH> -a ALIAS...`)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MODPROBE_PATH)]
    pub modprobe_path: PathBuf,

    /// Root of the device tree re-announced at startup
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SYSFS_ROOT)]
    pub sysfs_root: PathBuf,
}

/// Settings resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Loader path, or `None` when module loading is off
    pub modprobe: Option<PathBuf>,
    pub sysfs_root: PathBuf,
}

impl Args {
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            modprobe: self.modprobe.then(|| self.modprobe_path.clone()),
            sysfs_root: self.sysfs_root.clone(),
        }
    }
}
