//! External module loader invocation

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

/// Something that loads the modules for a batch of aliases
pub trait ModuleLoader {
    /// Load modules for `aliases`, blocking until done. Failures are ignored.
    fn load(&mut self, aliases: &[OsString]);
}

/// Runs `<path> -a alias...` with stdio on `/dev/null`
#[derive(Debug, Clone)]
pub struct Modprobe {
    path: PathBuf,
}

impl Modprobe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the loader command for a batch
    pub fn command(&self, aliases: &[OsString]) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.arg("-a")
            .args(aliases)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl ModuleLoader for Modprobe {
    fn load(&mut self, aliases: &[OsString]) {
        // status() waits on this child only, retrying EINTR
        match self.command(aliases).status() {
            Ok(status) => debug!("{} -a ({} aliases): {status}", self.path.display(), aliases.len()),
            Err(e) => debug!("Failed to run {}: {e}", self.path.display()),
        }
    }
}
