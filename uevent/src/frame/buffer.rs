//! Per-cycle output accumulation buffer

use uevent_common::{MAX_FRAME_SIZE, OUTPUT_BUFFER_SIZE};

use super::encoder::{encode_frame_within, FrameError};
use crate::domain::UeventRecord;

/// Frames accumulated during one drain cycle, written out in one go
///
/// A new frame is only started while at least `margin` bytes remain, and a
/// frame larger than `margin` is rejected, so the buffer never grows past
/// `capacity`.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
    capacity: usize,
    margin: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_capacity(OUTPUT_BUFFER_SIZE, MAX_FRAME_SIZE)
    }
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// Panics if `margin` is larger than `capacity`
    #[must_use]
    pub fn with_capacity(capacity: usize, margin: usize) -> Self {
        assert!(margin <= capacity, "margin must fit inside the buffer");
        Self { buf: Vec::with_capacity(capacity), capacity, margin }
    }

    /// True while a worst-case frame still fits
    pub fn has_room(&self) -> bool {
        self.buf.len() + self.margin <= self.capacity
    }

    /// Encode `record` at the current offset
    ///
    /// # Errors
    /// Returns the encoder's error, including a frame over `margin` bytes;
    /// the offset does not move in that case.
    pub fn push(&mut self, record: &UeventRecord) -> Result<usize, FrameError> {
        debug_assert!(self.has_room());
        encode_frame_within(record, &mut self.buf, self.margin)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reset for the next cycle, keeping the allocation
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
