//! # Kernel uevent netlink socket
//!
//! Opens a `NETLINK_KOBJECT_UEVENT` socket bound to the kernel's single
//! uevent multicast group and reads datagrams from it without blocking.
//!
//! ENOBUFS reporting is switched off. When the socket overflows the lost
//! events are gone either way, and surfacing the error would only stop the
//! reader.

#![allow(unsafe_code)] // socket(2), bind(2), setsockopt(2), recv(2)

use std::io;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use log::debug;

use super::DatagramSource;
use crate::domain::UeventError;

/// Kobject uevents are broadcast on group 1 (bit 0)
pub const UEVENT_GROUP: u32 = 1 << 0;

/// Non-blocking, close-on-exec uevent socket
#[derive(Debug)]
pub struct UeventSocket {
    fd: OwnedFd,
}

impl UeventSocket {
    /// Open and bind the socket
    ///
    /// # Errors
    /// Returns an error if the socket cannot be created, bound, or configured.
    /// Callers treat all of these as fatal.
    pub fn open() -> Result<Self, UeventError> {
        let raw = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                libc::NETLINK_KOBJECT_UEVENT,
            )
        };
        if raw < 0 {
            return Err(UeventError::SocketOpenFailed(io::Error::last_os_error()));
        }
        // SAFETY: socket() just returned this descriptor and nothing else owns it
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: sockaddr_nl is plain old data; all-zero is a valid value
        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        // nl_pid = 0 lets the kernel assign the port id
        addr.nl_pid = 0;
        addr.nl_groups = UEVENT_GROUP;

        #[allow(clippy::cast_possible_truncation)]
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                std::ptr::addr_of!(addr).cast::<libc::sockaddr>(),
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(UeventError::SocketBindFailed {
                group: UEVENT_GROUP,
                error: io::Error::last_os_error(),
            });
        }

        let on: libc::c_int = 1;
        #[allow(clippy::cast_possible_truncation)]
        let rc = unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                libc::SOL_NETLINK,
                libc::NETLINK_NO_ENOBUFS,
                std::ptr::addr_of!(on).cast::<libc::c_void>(),
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(UeventError::SocketOptionFailed {
                option: "NETLINK_NO_ENOBUFS",
                error: io::Error::last_os_error(),
            });
        }

        debug!("uevent socket open (fd {})", fd.as_raw_fd());
        Ok(Self { fd })
    }
}

impl DatagramSource for UeventSocket {
    fn read_one(&self, buf: &mut [u8]) -> Result<Option<usize>, UeventError> {
        loop {
            // MSG_TRUNC makes recv report the full datagram length so
            // oversized messages can be detected and skipped
            let n = unsafe {
                libc::recv(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                    libc::MSG_TRUNC,
                )
            };

            if n < 0 {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock => return Ok(None),
                    io::ErrorKind::Interrupted => continue,
                    _ => return Err(UeventError::ReceiveFailed(err)),
                }
            }

            #[allow(clippy::cast_sign_loss)]
            let len = n as usize;
            if len > buf.len() {
                debug!("Dropping truncated uevent ({len} bytes)");
                continue;
            }
            return Ok(Some(len));
        }
    }
}

impl AsRawFd for UeventSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for UeventSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
