//! Backend for installing Arch Linux onto Macs with the T2 security chip.
//!
//! The installer partitions a target device, creates the file systems and the
//! optional LVM volume chain, and mounts the result at the installation root.
//! Every external program is driven through the streaming command runner of
//! `t2inst-chroot`, so that its output reaches the front end as it is produced.

extern crate dirs;
extern crate disk_types;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate fern;
extern crate libc;
#[macro_use]
extern crate log;
pub extern crate t2inst_chroot as chroot;
pub extern crate t2inst_disk_ops as disk_ops;
pub extern crate t2inst_disks as disks;
pub extern crate t2inst_external_commands as external;
#[cfg(test)]
extern crate tempdir;

mod errors;
mod installer;
mod logging;

pub use self::{errors::*, installer::*, logging::log};
pub use chroot::{CommandResult, Failure, Request, DEFAULT_TIMEOUT};
pub use disk_ops::{LayoutOptions, PartitionError, PlannedPartitions};
pub use disk_types::{partition_path, FileSystem, Partition, PartitionExt};
pub use disks::{Inspect, InspectError, Lsblk};

use std::sync::atomic::AtomicBool;

/// When set to true, this will stop the installation process, and kill the
/// command that is currently running.
pub static KILL_SWITCH: AtomicBool = AtomicBool::new(false);
