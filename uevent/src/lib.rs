//! # uevent - Kernel Hotplug Event Bridge
//!
//! Listens on the kernel's uevent netlink group and streams every device
//! event to a parent process as a length-prefixed Erlang term. At startup it
//! replays devices that are already present, and it can optionally load
//! kernel modules for newly added devices.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Linux Kernel (kobject)                      │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ NETLINK_KOBJECT_UEVENT, group 1
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      uevent (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │     Bus      │──▶│    Parser    │──▶│    Frame     │──▶ stdout
//! │  │  (netlink)   │   │  (filters)   │   │  (encoder)   │         │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘         │
//! │         ▲                  │ modalias on add                    │
//! │         │                  ▼                                    │
//! │         │           ┌──────────────┐                            │
//! │         │           │   Modprobe   │──▶ /sbin/modprobe -a ...   │
//! │         │           │  (batcher)   │                            │
//! │         │           └──────────────┘                            │
//! │         │                                                       │
//! │  ┌──────┴───────┐                                               │
//! │  │  Discovery   │  writes "add" into /sys/devices/**/uevent     │
//! │  └──────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────┘
//!                         ▲
//!                         │ stdin readable or closed → exit
//!                   parent process
//! ```
//!
//! ## Module Structure
//!
//! - [`bus`]: netlink socket and the [`bus::DatagramSource`] read seam
//! - [`parser`]: raw datagram → [`domain::UeventRecord`], drop rules and caps
//! - [`frame`]: record → `[u16 len][131][{action, devpath, attrs}]`
//! - [`modprobe`]: bounded alias batching and the external loader
//! - [`discovery`]: startup walk of the device tree
//! - [`dispatcher`]: the readiness loop tying everything together
//! - [`cli`]: command-line arguments and resolved configuration
//! - [`preflight`]: non-fatal environment checks
//! - [`domain`]: core types and errors
//!
//! ## Output Format
//!
//! Each frame decodes with `:erlang.binary_to_term/1` to
//!
//! ```text
//! {:add, ["devices", "platform", "foo"], %{"subsystem" => "platform"}}
//! ```
//!
//! `ACTION`, `DEVPATH`, `SEQNUM` and `SYNTH_UUID` are never in the map, and
//! map keys are lowercase.
//!
//! ## Typical Usage
//!
//! ```bash
//! # From an Erlang port opened with {:packet, 2}
//! uevent --modprobe
//! ```

pub mod bus;
pub mod cli;
pub mod discovery;
pub mod dispatcher;
pub mod domain;
pub mod frame;
pub mod modprobe;
pub mod parser;
pub mod preflight;
