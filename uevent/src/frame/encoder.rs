//! Record → length-prefixed term encoding
//!
//! Each frame is `[u16 BE payload length][131][{atom, [binary], map}]`.

use thiserror::Error;
use uevent_common::{
    BINARY_EXT, LENGTH_PREFIX_SIZE, LIST_EXT, MAP_EXT, MAX_FRAME_SIZE, NIL_EXT, RECORD_ARITY,
    SMALL_ATOM_UTF8_EXT, SMALL_TUPLE_EXT, VERSION_MAGIC,
};

use crate::domain::UeventRecord;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("Encoded frame of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Action {0:?} is too long for an atom")]
    ActionTooLong(String),
}

/// Append one frame for `record` to `out`
///
/// Returns the number of bytes appended, prefix included. On error `out` is
/// truncated back to its original length so no partial frame survives.
///
/// # Errors
/// Returns an error if the action cannot be an atom or the frame would exceed
/// [`MAX_FRAME_SIZE`].
pub fn encode_frame(record: &UeventRecord, out: &mut Vec<u8>) -> Result<usize, FrameError> {
    encode_frame_within(record, out, MAX_FRAME_SIZE)
}

/// [`encode_frame`] with a tighter size limit; `limit` is capped at
/// [`MAX_FRAME_SIZE`]
///
/// # Errors
/// As [`encode_frame`], with `limit` in place of [`MAX_FRAME_SIZE`].
pub fn encode_frame_within(
    record: &UeventRecord,
    out: &mut Vec<u8>,
    limit: usize,
) -> Result<usize, FrameError> {
    let limit = limit.min(MAX_FRAME_SIZE);
    let start = out.len();
    if let Err(e) = encode_payload(record, out) {
        out.truncate(start);
        return Err(e);
    }

    let size = out.len() - start;
    if size > limit {
        out.truncate(start);
        return Err(FrameError::TooLarge { size, limit });
    }

    // Back-fill the prefix; MAX_FRAME_SIZE keeps this within u16
    #[allow(clippy::cast_possible_truncation)]
    let payload_len = (size - LENGTH_PREFIX_SIZE) as u16;
    out[start..start + LENGTH_PREFIX_SIZE].copy_from_slice(&payload_len.to_be_bytes());
    Ok(size)
}

fn encode_payload(record: &UeventRecord, out: &mut Vec<u8>) -> Result<(), FrameError> {
    out.extend_from_slice(&[0; LENGTH_PREFIX_SIZE]);
    out.push(VERSION_MAGIC);
    out.extend_from_slice(&[SMALL_TUPLE_EXT, RECORD_ARITY]);

    let action = record.action.as_str();
    let action_len =
        u8::try_from(action.len()).map_err(|_| FrameError::ActionTooLong(action.to_string()))?;
    out.extend_from_slice(&[SMALL_ATOM_UTF8_EXT, action_len]);
    out.extend_from_slice(action.as_bytes());

    if !record.devpath.is_empty() {
        put_header(out, LIST_EXT, record.devpath.len());
        for segment in &record.devpath {
            put_binary(out, segment);
        }
    }
    out.push(NIL_EXT);

    put_header(out, MAP_EXT, record.attributes.len());
    for (key, value) in record.attributes.iter() {
        put_binary(out, key);
        put_binary(out, value);
    }
    Ok(())
}

// Lengths here are bounded by the datagram size, far below u32::MAX
#[allow(clippy::cast_possible_truncation)]
fn put_header(out: &mut Vec<u8>, tag: u8, count: usize) {
    out.push(tag);
    out.extend_from_slice(&(count as u32).to_be_bytes());
}

fn put_binary(out: &mut Vec<u8>, bytes: &[u8]) {
    put_header(out, BINARY_EXT, bytes.len());
    out.extend_from_slice(bytes);
}
