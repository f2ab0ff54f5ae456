//! Domain model for uevent
//!
//! This module contains core domain types and errors that provide:
//! - The structured record produced from one kernel datagram
//! - Structured error handling for the fatal paths

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Action, Attributes, UeventRecord};

pub use errors::UeventError;
