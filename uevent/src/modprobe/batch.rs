//! Bounded batch of pending module aliases

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use uevent_common::{MODPROBE_BATCH_BYTES, MODPROBE_BATCH_SLOTS};

/// Pending aliases plus a running byte count
///
/// Each alias costs `len + 1` bytes against the budget (it is passed as a
/// NUL-terminated argv entry). Aliases are kept as raw bytes; the kernel
/// does not promise UTF-8.
#[derive(Debug, Clone)]
pub struct ModprobeBatch {
    aliases: Vec<OsString>,
    bytes: usize,
    max_bytes: usize,
    max_slots: usize,
}

/// Outcome of offering an alias to the batch
#[derive(Debug, PartialEq, Eq)]
pub enum Push {
    /// Alias appended
    Queued,
    /// Batch is full; flush first, then push again
    Full,
    /// Alias exceeds the whole byte budget and can never be queued
    TooLarge,
}

impl Default for ModprobeBatch {
    fn default() -> Self {
        Self::with_capacity(MODPROBE_BATCH_BYTES, MODPROBE_BATCH_SLOTS)
    }
}

impl ModprobeBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(max_bytes: usize, max_slots: usize) -> Self {
        Self { aliases: Vec::with_capacity(max_slots), bytes: 0, max_bytes, max_slots }
    }

    /// Try to append an alias without ever exceeding capacity
    pub fn push(&mut self, alias: &[u8]) -> Push {
        let cost = alias.len() + 1;
        if cost > self.max_bytes {
            return Push::TooLarge;
        }
        if self.bytes + cost > self.max_bytes || self.aliases.len() >= self.max_slots {
            return Push::Full;
        }
        self.aliases.push(OsStr::from_bytes(alias).to_os_string());
        self.bytes += cost;
        Push::Queued
    }

    /// Hand out the pending aliases and reset to empty
    pub fn take(&mut self) -> Vec<OsString> {
        self.bytes = 0;
        std::mem::take(&mut self.aliases)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Bytes currently charged against the budget
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}
