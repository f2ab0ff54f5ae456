//! # Event dispatch loop
//!
//! Single-threaded loop that owns the output buffer and the module-load
//! batch. Each iteration waits on exactly one `select!`:
//!
//! ```text
//!            ┌────────────── control channel readable / hung up ──▶ shutdown
//!            │
//!  select! ──┼────────────── Ctrl+C ─────────────────────────────▶ shutdown
//!            │
//!            ├────────────── uevent socket readable ──▶ drain cycle
//!            │                                          read → parse → encode
//!            │                                          flush modprobe batch
//!            │                                          one write of all frames
//!            │
//!            └────────────── discovery task finished ──▶ reap, log
//! ```
//!
//! The control branch is polled first so that once shutdown is requested no
//! further frames are written.

use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::PathBuf;

use log::{debug, info, warn};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::task::JoinHandle;
use uevent_common::MAX_EVENT_SIZE;

use crate::bus::{DatagramSource, UeventSocket};
use crate::discovery::{spawn_discovery, DiscoveryStats};
use crate::domain::UeventError;
use crate::frame::OutputBuffer;
use crate::modprobe::{ModuleLoadBatcher, ModuleLoader};
use crate::parser;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    ControlChannel,
    Interrupted,
}

/// Running totals across drain cycles
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub cycles: u64,
    pub events: u64,
    pub frames: u64,
    pub dropped: u64,
}

/// Owns everything a drain cycle mutates
pub struct Dispatcher<W: Write, L: ModuleLoader> {
    output: W,
    buffer: OutputBuffer,
    recv_buf: Box<[u8]>,
    batcher: Option<ModuleLoadBatcher<L>>,
    pub stats: DrainStats,
}

impl<W: Write, L: ModuleLoader> Dispatcher<W, L> {
    /// `batcher` is `None` when module loading is disabled
    pub fn new(output: W, batcher: Option<ModuleLoadBatcher<L>>) -> Self {
        Self::with_buffer(output, batcher, OutputBuffer::new())
    }

    pub fn with_buffer(
        output: W,
        batcher: Option<ModuleLoadBatcher<L>>,
        buffer: OutputBuffer,
    ) -> Self {
        Self {
            output,
            buffer,
            recv_buf: vec![0; MAX_EVENT_SIZE].into_boxed_slice(),
            batcher,
            stats: DrainStats::default(),
        }
    }

    /// Run one drain cycle against `source`
    ///
    /// Reads until the source would block or the buffer has no room for
    /// another worst-case frame, flushes the module-load batch, then writes
    /// every accumulated frame in a single call.
    ///
    /// Returns `true` if the source was exhausted, `false` if the cycle
    /// stopped because the buffer filled up.
    ///
    /// # Errors
    /// Receive and output write failures; both are fatal.
    pub fn drain<S: DatagramSource + ?Sized>(&mut self, source: &S) -> Result<bool, UeventError> {
        self.buffer.clear();
        self.stats.cycles += 1;
        let mut exhausted = false;

        while self.buffer.has_room() {
            let Some(len) = source.read_one(&mut self.recv_buf)? else {
                exhausted = true;
                break;
            };
            self.stats.events += 1;

            let raw = &self.recv_buf[..len];
            let loading = self.batcher.is_some();
            let mut aliases: Vec<Vec<u8>> = Vec::new();
            let record = parser::parse_with(raw, |alias| {
                if loading {
                    aliases.push(alias.to_vec());
                }
            });

            let Some(record) = record else {
                self.stats.dropped += 1;
                continue;
            };

            // Only events that made it onto the output trigger module loads
            match self.buffer.push(&record) {
                Ok(_) => {
                    debug!("uevent: {record}");
                    self.stats.frames += 1;
                    if let Some(batcher) = self.batcher.as_mut() {
                        for alias in &aliases {
                            batcher.enqueue(alias);
                        }
                    }
                }
                Err(e) => {
                    debug!("Dropping {record}: {e}");
                    self.stats.dropped += 1;
                }
            }
        }

        if let Some(batcher) = self.batcher.as_mut() {
            batcher.flush();
        }

        if !self.buffer.is_empty() {
            self.output
                .write_all(self.buffer.as_bytes())
                .and_then(|()| self.output.flush())
                .map_err(UeventError::OutputWriteFailed)?;
        }

        Ok(exhausted)
    }

    pub fn batcher(&self) -> Option<&ModuleLoadBatcher<L>> {
        self.batcher.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Open the uevent socket, start discovery and dispatch until shutdown
    ///
    /// # Errors
    /// Socket setup, readiness wait, receive and write failures.
    pub async fn run(
        &mut self,
        control: &ControlChannel,
        sysfs_root: PathBuf,
    ) -> Result<ShutdownReason, UeventError> {
        let bus = AsyncFd::with_interest(UeventSocket::open()?, Interest::READABLE)?;

        // No replay on the socket: re-announce what is already plugged in
        let discovery = spawn_discovery(sysfs_root);

        self.run_with(bus, control, Some(discovery)).await
    }

    /// Dispatch from an already registered `bus` until shutdown
    ///
    /// `discovery`, when given, is reaped as soon as it finishes.
    ///
    /// # Errors
    /// Readiness wait, receive and write failures.
    pub async fn run_with<S: DatagramSource + AsRawFd>(
        &mut self,
        bus: AsyncFd<S>,
        control: &ControlChannel,
        mut discovery: Option<JoinHandle<DiscoveryStats>>,
    ) -> Result<ShutdownReason, UeventError> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut ctrl_c_armed = true;

        let reason = loop {
            tokio::select! {
                biased;

                res = control.ready() => {
                    res.map_err(UeventError::WaitFailed)?;
                    break ShutdownReason::ControlChannel;
                }
                res = &mut ctrl_c, if ctrl_c_armed => {
                    match res {
                        Ok(()) => break ShutdownReason::Interrupted,
                        Err(e) => {
                            warn!("Ctrl+C handler unavailable: {e}");
                            ctrl_c_armed = false;
                        }
                    }
                }
                guard = bus.readable() => {
                    let mut guard = guard.map_err(UeventError::WaitFailed)?;
                    if self.drain(guard.get_inner())? {
                        guard.clear_ready();
                    }
                }
                joined = async {
                    match discovery.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if discovery.is_some() => {
                    discovery = None;
                    if let Err(e) = joined {
                        warn!("Discovery task failed: {e}");
                    }
                }
            }
        };

        info!(
            "Shutting down ({reason:?}): {} cycles, {} events, {} frames, {} dropped",
            self.stats.cycles, self.stats.events, self.stats.frames, self.stats.dropped
        );
        Ok(reason)
    }
}

/// Shutdown signal from the parent process
///
/// Any readable data or a hang-up means "exit". The content is never read.
#[derive(Debug)]
pub enum ControlChannel {
    Watch(AsyncFd<OwnedFd>),
    /// Not pollable or not open. poll(2) would report it readable forever,
    /// so it is treated as an immediate shutdown request.
    AlwaysReady,
}

impl ControlChannel {
    /// Watch a duplicate of stdin
    ///
    /// Must be called from within a tokio runtime.
    pub fn stdin() -> Self {
        match io::stdin().as_fd().try_clone_to_owned() {
            Ok(fd) => Self::watch(fd),
            Err(e) => {
                warn!("Control channel unavailable: {e}");
                Self::AlwaysReady
            }
        }
    }

    pub fn watch(fd: OwnedFd) -> Self {
        match AsyncFd::with_interest(fd, Interest::READABLE) {
            Ok(fd) => Self::Watch(fd),
            Err(e) => {
                // Regular files and /dev/null cannot be registered with epoll
                debug!("Control channel not pollable ({e})");
                Self::AlwaysReady
            }
        }
    }

    /// Resolve once the channel is readable or hung up
    ///
    /// # Errors
    /// Returns an error if the readiness wait itself fails
    pub async fn ready(&self) -> io::Result<()> {
        match self {
            Self::Watch(fd) => fd.readable().await.map(|_| ()),
            Self::AlwaysReady => Ok(()),
        }
    }
}
