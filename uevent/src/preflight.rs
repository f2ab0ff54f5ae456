//! Pre-flight checks for uevent
//!
//! Looks for setups that will run but not do everything asked of them. None
//! of these stop startup: the event stream itself works without them.

#![allow(unsafe_code)] // geteuid() requires unsafe

use log::warn;
use std::path::Path;

use crate::cli::Config;

/// Run all pre-flight checks, logging each finding. Returns the findings.
pub fn run_preflight_checks(config: &Config) -> Vec<String> {
    let findings: Vec<String> = [
        check_privileges(),
        check_sysfs_root(&config.sysfs_root),
        config.modprobe.as_deref().and_then(check_modprobe),
    ]
    .into_iter()
    .flatten()
    .collect();

    for finding in &findings {
        warn!("{finding}");
    }
    findings
}

/// Discovery writes into sysfs, which is root-only
fn check_privileges() -> Option<String> {
    if unsafe { libc::geteuid() } == 0 {
        return None;
    }
    Some("Not running as root: discovery writes will likely fail with permission denied".into())
}

fn check_sysfs_root(root: &Path) -> Option<String> {
    if root.is_dir() {
        return None;
    }
    Some(format!(
        "Device tree {} not found: devices present at startup will not be reported",
        root.display()
    ))
}

fn check_modprobe(path: &Path) -> Option<String> {
    if path.is_file() {
        return None;
    }
    Some(format!("Module loader {} not found: modules will not be loaded", path.display()))
}
