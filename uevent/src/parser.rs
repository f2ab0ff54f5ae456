//! # Uevent record parsing
//!
//! Turns one raw kernel datagram into a [`UeventRecord`].
//!
//! The datagram layout is a run of NUL-terminated fields:
//!
//! ```text
//! add@/devices/platform/foo\0ACTION=add\0DEVPATH=/devices/platform/foo\0SUBSYSTEM=platform\0SEQNUM=5\0
//! └──── header ───────────┘  └──────────────── KEY=VALUE fields ─────────────────────────────────┘
//! ```
//!
//! ## Drop rules
//!
//! - Header without `@`, or with an action that cannot be an atom: whole event dropped
//! - Devpath outside [`DEVICES_PREFIX`]: whole event dropped
//! - Field without `=`, or with a reserved key: that field dropped
//! - Segments past [`MAX_SEGMENTS`] and attributes past [`MAX_ATTRIBUTES`]: dropped,
//!   the rest of the record is kept

use log::trace;
use uevent_common::{DEVICES_PREFIX, MAX_ATTRIBUTES, MAX_SEGMENTS, MODALIAS_KEY, RESERVED_KEYS};

use crate::domain::{Action, Attributes, UeventRecord};

/// Parse a datagram, ignoring any module aliases it carries
pub fn parse(raw: &[u8]) -> Option<UeventRecord> {
    parse_with(raw, |_| {})
}

/// Parse a datagram, calling `on_modalias` for each `modalias` value on an
/// `add` event
///
/// Aliases are reported even when the attribute itself falls past the
/// attribute cap, so the driver still gets loaded.
pub fn parse_with<F>(raw: &[u8], mut on_modalias: F) -> Option<UeventRecord>
where
    F: FnMut(&[u8]),
{
    let mut fields = raw.split(|&b| b == 0);

    let header = fields.next()?;
    let at = header.iter().position(|&b| b == b'@')?;
    let (action, devpath) = (&header[..at], &header[at + 1..]);

    let action = parse_action(action)?;

    if !devpath.starts_with(DEVICES_PREFIX.as_bytes()) {
        trace!("Ignoring non-device uevent {}", String::from_utf8_lossy(header));
        return None;
    }
    let devpath = split_devpath(devpath);

    let mut attributes = Attributes::new();
    for field in fields {
        let Some(eq) = field.iter().position(|&b| b == b'=') else {
            continue;
        };
        let (key, value) = (&field[..eq], &field[eq + 1..]);

        if is_reserved(key) {
            continue;
        }
        let key = key.to_ascii_lowercase();

        if action.is_add() && key == MODALIAS_KEY.as_bytes() {
            on_modalias(value);
        }

        if attributes.len() >= MAX_ATTRIBUTES {
            trace!("Attribute cap reached, dropping {}", String::from_utf8_lossy(&key));
            continue;
        }
        attributes.insert(key, value.to_vec());
    }

    Some(UeventRecord { action, devpath, attributes })
}

/// Actions are emitted as atoms: UTF-8 and at most 255 bytes
fn parse_action(raw: &[u8]) -> Option<Action> {
    if raw.len() > usize::from(u8::MAX) {
        return None;
    }
    let name = std::str::from_utf8(raw).ok()?;
    Some(Action::new(name))
}

/// `/devices/a/b` → `["devices", "a", "b"]`, empty segments skipped
fn split_devpath(devpath: &[u8]) -> Vec<Vec<u8>> {
    devpath
        .split(|&b| b == b'/')
        .filter(|segment| !segment.is_empty())
        .take(MAX_SEGMENTS)
        .map(<[u8]>::to_vec)
        .collect()
}

fn is_reserved(key: &[u8]) -> bool {
    RESERVED_KEYS.iter().any(|reserved| key.eq_ignore_ascii_case(reserved.as_bytes()))
}
