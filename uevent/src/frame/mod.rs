//! # Frame encoding
//!
//! Records are written as length-prefixed Erlang external terms so the parent
//! process can read them with `{:packet, 2}` framing and `binary_to_term/1`.
//!
//! - [`encode_frame`]: one record → one frame appended to a byte vector
//! - [`OutputBuffer`]: bounded accumulation of frames for one drain cycle

pub mod buffer;
pub mod encoder;

pub use buffer::OutputBuffer;
pub use encoder::{encode_frame, encode_frame_within, FrameError};
