//! Domain types for parsed uevents
//!
//! Values coming from the kernel are kept as raw bytes. Only the action is
//! required to be text, since it is emitted as an atom.

use std::fmt;

/// Uevent action (`add`, `remove`, `change`, `bind`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Action(String);

impl Action {
    /// Create an action from the header text before `@`
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the action as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the `add` action, the only one that loads modules
    pub fn is_add(&self) -> bool {
        self.0 == uevent_common::ADD_ACTION
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered attribute map with unique, lowercase keys
///
/// Insertion order is preserved so the emitted map follows the order the
/// kernel sent the fields in. A repeated key keeps its first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair. Returns false if the key was already present.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> bool {
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key.as_bytes())
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

/// One accepted uevent, ready for encoding
///
/// Built once by the parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeventRecord {
    pub action: Action,
    /// Device path split on `/`, e.g. `["devices", "platform", "foo"]`
    pub devpath: Vec<Vec<u8>>,
    pub attributes: Attributes,
}

impl UeventRecord {
    /// Devpath segments as lossy strings (for logging and tests)
    pub fn devpath_lossy(&self) -> Vec<String> {
        self.devpath.iter().map(|s| String::from_utf8_lossy(s).into_owned()).collect()
    }
}

impl fmt::Display for UeventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@/{}", self.action, self.devpath_lossy().join("/"))
    }
}
