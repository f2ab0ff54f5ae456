//! # Module load batching
//!
//! `add` events that carry a `modalias` are collected into one batch per
//! drain cycle and handed to the module loader in a single invocation.
//!
//! ## Capacity policy
//!
//! The batch never exceeds its byte budget or slot count. When a new alias
//! would not fit, the existing batch is flushed first and the alias starts
//! the next batch. The dispatcher flushes once more at the end of every drain
//! cycle so nothing is carried over.
//!
//! Flushing blocks the caller until the loader exits. Its exit status is
//! ignored: a device without a driver is often still usable, and there is
//! nothing sensible to retry.

pub mod batch;
pub mod loader;

pub use batch::{ModprobeBatch, Push};
pub use loader::{Modprobe, ModuleLoader};

use log::{debug, warn};

/// Owns the pending batch and the loader that drains it
#[derive(Debug)]
pub struct ModuleLoadBatcher<L: ModuleLoader> {
    batch: ModprobeBatch,
    loader: L,
    /// Number of loader invocations so far
    pub flushes: usize,
}

impl<L: ModuleLoader> ModuleLoadBatcher<L> {
    pub fn new(loader: L) -> Self {
        Self::with_batch(loader, ModprobeBatch::new())
    }

    pub fn with_batch(loader: L, batch: ModprobeBatch) -> Self {
        Self { batch, loader, flushes: 0 }
    }

    /// Queue an alias, flushing the current batch first if it would overflow
    ///
    /// The alias bytes are passed to the loader unchanged.
    pub fn enqueue(&mut self, alias: &[u8]) {
        match self.batch.push(alias) {
            Push::Queued => {}
            Push::Full => {
                self.flush();
                // An empty batch always has room for an alias that is not TooLarge
                let pushed = self.batch.push(alias);
                debug_assert_eq!(pushed, Push::Queued);
            }
            Push::TooLarge => warn!("Dropping oversized modalias ({} bytes)", alias.len()),
        }
    }

    /// Run the loader for everything queued; no-op when empty
    pub fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let aliases = self.batch.take();
        debug!("Loading modules for {} aliases", aliases.len());
        self.loader.load(&aliases);
        self.flushes += 1;
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::ffi::OsString;
    use std::os::unix::ffi::OsStrExt;

    /// Records every invocation instead of spawning a process
    #[derive(Debug, Default)]
    pub(crate) struct RecordingLoader {
        pub calls: Vec<Vec<OsString>>,
    }

    impl ModuleLoader for RecordingLoader {
        fn load(&mut self, aliases: &[OsString]) {
            self.calls.push(aliases.to_vec());
        }
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut batcher = ModuleLoadBatcher::new(RecordingLoader::default());
        batcher.flush();
        assert!(batcher.loader().calls.is_empty());
        assert_eq!(batcher.flushes, 0);
    }

    #[test]
    fn test_flushes_once_before_overflowing_alias() {
        // 3 aliases of 4 chars cost 15 bytes; the 4th would make 20 > 16
        let batch = ModprobeBatch::with_capacity(16, 30);
        let mut batcher = ModuleLoadBatcher::with_batch(RecordingLoader::default(), batch);

        for alias in ["v001", "v002", "v003"] {
            batcher.enqueue(alias.as_bytes());
        }
        assert!(batcher.loader().calls.is_empty());

        batcher.enqueue(b"v004");
        assert_eq!(batcher.loader().calls, vec![vec!["v001", "v002", "v003"]]);
        assert_eq!(batcher.pending(), 1);

        batcher.flush();
        assert_eq!(batcher.loader().calls.len(), 2);
        assert_eq!(batcher.loader().calls[1], vec!["v004"]);
        assert_eq!(batcher.pending(), 0);
    }

    #[test]
    fn test_slot_limit_triggers_flush() {
        let batch = ModprobeBatch::with_capacity(1024, 2);
        let mut batcher = ModuleLoadBatcher::with_batch(RecordingLoader::default(), batch);
        for alias in ["a", "b", "c"] {
            batcher.enqueue(alias.as_bytes());
        }
        assert_eq!(batcher.loader().calls, vec![vec!["a", "b"]]);
        assert_eq!(batcher.pending(), 1);
    }

    #[test]
    fn test_oversized_alias_dropped() {
        let batch = ModprobeBatch::with_capacity(8, 4);
        let mut batcher = ModuleLoadBatcher::with_batch(RecordingLoader::default(), batch);
        batcher.enqueue(b"abc");
        batcher.enqueue(b"much-too-long-alias");
        assert_eq!(batcher.pending(), 1);
        batcher.flush();
        assert_eq!(batcher.loader().calls, vec![vec!["abc"]]);
    }

    #[test]
    fn test_non_utf8_alias_reaches_loader() {
        let mut batcher = ModuleLoadBatcher::new(RecordingLoader::default());
        batcher.enqueue(b"usb:v\xff01");
        batcher.flush();

        let calls = &batcher.loader().calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].as_bytes(), b"usb:v\xff01");
    }
}
