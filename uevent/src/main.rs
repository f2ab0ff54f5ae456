//! # uevent - Main Entry Point
//!
//! Runs until the parent process writes to or closes stdin, or until Ctrl+C.
//! Frames go to stdout; everything human-readable goes to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::os::fd::AsFd;

use uevent::cli::Args;
use uevent::dispatcher::{ControlChannel, Dispatcher};
use uevent::modprobe::{Modprobe, ModuleLoadBatcher};
use uevent::preflight::run_preflight_checks;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") || msg.contains("operation not permitted") {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.config();

    info!("uevent v{}", env!("CARGO_PKG_VERSION"));
    info!("config: {config:?}");
    run_preflight_checks(&config);

    // Write frames through a private handle so nothing line-buffers them
    let output = stdout_file().context("Failed to open stdout for frames")?;
    let batcher = config.modprobe.clone().map(|path| ModuleLoadBatcher::new(Modprobe::new(path)));
    let mut dispatcher = Dispatcher::new(output, batcher);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        let control = ControlChannel::stdin();
        dispatcher.run(&control, config.sysfs_root.clone()).await
    });

    // Discovery may still be walking; exit without waiting for it
    runtime.shutdown_background();

    let reason = result.context("uevent dispatch failed")?;
    info!("exit: {reason:?}");
    Ok(())
}

fn stdout_file() -> std::io::Result<File> {
    let fd = std::io::stdout().as_fd().try_clone_to_owned()?;
    Ok(File::from(fd))
}
