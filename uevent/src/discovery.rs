//! # Startup device discovery
//!
//! The uevent socket has no backlog, so devices that appeared before we
//! started listening would never be reported. To replay them, the device tree
//! is walked once at startup and `add` is written into every `uevent` file.
//! The kernel answers each write with a synthetic `add` event, which then
//! flows through the normal socket → parser → encoder pipeline.
//!
//! ## Ordering
//!
//! Within a directory the `uevent` file is triggered before descending into
//! subdirectories, and subdirectories are visited in byte order. A bus is
//! therefore announced before the devices on it.
//!
//! Symlinks are never followed (sysfs is full of them and many form cycles),
//! and dot-directories are skipped.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::task::JoinHandle;
use uevent_common::{DISCOVERY_TRIGGER, UEVENT_FILE};

/// Counters from one discovery walk
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub triggered: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct Entry {
    name: OsString,
    is_dir: bool,
}

/// Run the discovery walk on the blocking pool
///
/// The dispatcher keeps the returned handle and reaps exactly this task.
pub fn spawn_discovery(root: PathBuf) -> JoinHandle<DiscoveryStats> {
    tokio::task::spawn_blocking(move || {
        info!("Discovering devices under {}", root.display());
        let stats = discover(&root);
        info!("Discovery done: {} triggered, {} failed", stats.triggered, stats.failed);
        stats
    })
}

/// Walk `root` and write `add` into every `uevent` file found
pub fn discover(root: &Path) -> DiscoveryStats {
    let mut stats = DiscoveryStats::default();
    walk(root, &mut |path| {
        if trigger(path) {
            stats.triggered += 1;
        } else {
            stats.failed += 1;
        }
    });
    stats
}

/// Depth-first walk calling `on_uevent` for each `uevent` file in visit order
///
/// Unreadable directories are skipped silently.
pub fn walk<F>(dir: &Path, on_uevent: &mut F)
where
    F: FnMut(&Path),
{
    for entry in scan_dir(dir) {
        let path = dir.join(&entry.name);
        if entry.is_dir {
            walk(&path, on_uevent);
        } else {
            on_uevent(&path);
        }
    }
}

/// List the `uevent` file and visible subdirectories of `dir`, sorted
fn scan_dir(dir: &Path) -> Vec<Entry> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut entries: Vec<Entry> = read_dir
        .flatten()
        .filter_map(|dirent| {
            // file_type() does not follow symlinks
            let file_type = dirent.file_type().ok()?;
            let name = dirent.file_name();
            if file_type.is_file() && name == UEVENT_FILE {
                Some(Entry { name, is_dir: false })
            } else if file_type.is_dir() && !name.as_encoded_bytes().starts_with(b".") {
                Some(Entry { name, is_dir: true })
            } else {
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        let a_first = a.name != UEVENT_FILE;
        let b_first = b.name != UEVENT_FILE;
        a_first.cmp(&b_first).then_with(|| a.name.cmp(&b.name))
    });
    entries
}

/// Write the trigger into one `uevent` file; failures are expected and ignored
fn trigger(path: &Path) -> bool {
    let result = OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|mut file| file.write_all(DISCOVERY_TRIGGER));

    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Ignoring error when writing to {}: {e}", path.display());
            false
        }
    }
}
