//! Structured error types for uevent
//!
//! Every variant here is fatal: the engine has no useful work left once one of
//! these primitives fails. Malformed input and best-effort side effects never
//! produce an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UeventError {
    #[error("Failed to open uevent netlink socket")]
    SocketOpenFailed(#[source] std::io::Error),

    #[error("Failed to bind uevent netlink socket to group {group}")]
    SocketBindFailed {
        group: u32,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to set {option} on uevent socket")]
    SocketOptionFailed {
        option: &'static str,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to receive uevent")]
    ReceiveFailed(#[source] std::io::Error),

    #[error("Failed to write frames to output channel")]
    OutputWriteFailed(#[source] std::io::Error),

    #[error("Failed waiting for readiness")]
    WaitFailed(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
