//! # Shared Wire Definitions (Encoder ↔ Consumer)
//!
//! Constants describing the framed output stream and the fixed limits the
//! ingestion engine enforces. Anything that decodes the stream (the parent
//! process, test decoders) should take its tag values from here so both sides
//! agree on a single source.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌──────────┬─────┬──────────────────────────────────────────────┐
//! │ len: u16 │ 131 │ {Action :: atom, [binary], %{binary=>binary}}│
//! │ (BE)     │     │                                              │
//! └──────────┴─────┴──────────────────────────────────────────────┘
//! ```
//!
//! `len` counts everything after the prefix. Several frames may be written
//! back to back in one `write(2)`.

#![no_std]

// ============================================================================
// Term Tags (Erlang external term format)
// ============================================================================

/// Leading byte of every encoded term
pub const VERSION_MAGIC: u8 = 131;

/// Tuple with a one-byte arity
pub const SMALL_TUPLE_EXT: u8 = 104;

/// Atom with a one-byte length, UTF-8 payload
pub const SMALL_ATOM_UTF8_EXT: u8 = 119;

/// Proper list header with a four-byte element count, followed by a tail
pub const LIST_EXT: u8 = 108;

/// Empty list, also used as a proper list's tail
pub const NIL_EXT: u8 = 106;

/// Binary with a four-byte length
pub const BINARY_EXT: u8 = 109;

/// Map with a four-byte pair count
pub const MAP_EXT: u8 = 116;

/// Arity of the record tuple: `{action, devpath, attributes}`
pub const RECORD_ARITY: u8 = 3;

/// Size of the big-endian length prefix in front of each frame
pub const LENGTH_PREFIX_SIZE: usize = 2;

// ============================================================================
// Event Bus Input
// ============================================================================

/// Largest datagram read from the event bus in one call
///
/// Matches the libmnl socket buffer size. The kernel never emits uevents
/// larger than this (its own limit is 2048 bytes of environment).
pub const MAX_EVENT_SIZE: usize = 8192;

/// Only device paths under this subtree are forwarded
pub const DEVICES_PREFIX: &str = "/devices";

/// Keys never copied into the attribute map
///
/// `ACTION` and `DEVPATH` are already carried by the header; `SEQNUM` and
/// `SYNTH_UUID` have no use on the consumer side.
pub const RESERVED_KEYS: [&str; 4] = ["ACTION", "DEVPATH", "SEQNUM", "SYNTH_UUID"];

/// Attribute key that names a module alias
pub const MODALIAS_KEY: &str = "modalias";

/// Action that triggers module loading
pub const ADD_ACTION: &str = "add";

// ============================================================================
// Record Limits
// ============================================================================

/// Maximum devpath segments kept per record; deeper segments are dropped
pub const MAX_SEGMENTS: usize = 32;

/// Maximum attributes kept per record; later attributes are dropped
pub const MAX_ATTRIBUTES: usize = 64;

// ============================================================================
// Output Buffer
// ============================================================================

/// Upper bound on the encoding overhead a single record can add on top of
/// its raw datagram size
///
/// Worst case is 18 bytes of fixed headers, 4 extra bytes per segment and 8
/// extra bytes per attribute, which stays well under this with the caps above.
pub const MAX_FRAME_OVERHEAD: usize = 1024;

/// Largest frame the encoder will emit, prefix included
pub const MAX_FRAME_SIZE: usize = MAX_EVENT_SIZE + MAX_FRAME_OVERHEAD;

/// Capacity of the per-cycle output accumulation buffer
pub const OUTPUT_BUFFER_SIZE: usize = 64 * 1024;

// ============================================================================
// Module Loading
// ============================================================================

/// Default module loader executable
pub const DEFAULT_MODPROBE_PATH: &str = "/sbin/modprobe";

/// Byte budget for one module-load batch (each alias counts `len + 1`)
pub const MODPROBE_BATCH_BYTES: usize = 1024;

/// Maximum aliases per module-load invocation
///
/// Leaves room for the loader path and `-a` within a 32-slot argv.
pub const MODPROBE_BATCH_SLOTS: usize = 30;

// ============================================================================
// Discovery
// ============================================================================

/// Default root of the device tree walked at startup
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/devices";

/// Per-device file that re-triggers an event when written
pub const UEVENT_FILE: &str = "uevent";

/// Bytes written into each discovered `uevent` file
pub const DISCOVERY_TRIGGER: &[u8] = b"add";

// Compile-time sanity checks on the limits above
const _: () = assert!(MAX_FRAME_SIZE <= u16::MAX as usize + LENGTH_PREFIX_SIZE);
const _: () = assert!(MAX_FRAME_SIZE < OUTPUT_BUFFER_SIZE);
const _: () = assert!(18 + 4 * MAX_SEGMENTS + 8 * MAX_ATTRIBUTES <= MAX_FRAME_OVERHEAD);
