//! Event bus input
//!
//! - [`UeventSocket`]: the kernel netlink endpoint
//! - [`DatagramSource`]: the read side the dispatcher drains, so the drain
//!   loop can be exercised without a live socket

pub mod socket;

pub use socket::{UeventSocket, UEVENT_GROUP};

use crate::domain::UeventError;

/// Anything that yields raw uevent datagrams without blocking
pub trait DatagramSource {
    /// Receive the next datagram into `buf`
    ///
    /// Returns `Ok(None)` when nothing is queued (would-block).
    ///
    /// # Errors
    /// Any other receive failure. The dispatcher treats it as fatal.
    fn read_one(&self, buf: &mut [u8]) -> Result<Option<usize>, UeventError>;
}
