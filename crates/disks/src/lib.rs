//! Probes block devices for the partitions they currently hold.

extern crate disk_types;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

mod error;
mod lsblk;

pub use self::{error::InspectError, lsblk::*};

use disk_types::Partition;
use std::path::Path;

/// Reads the partitions currently present on a block device.
pub trait Inspect {
    /// Partitions on `device`, ordered by their start offset.
    fn list_partitions(&self, device: &Path) -> Result<Vec<Partition>, InspectError>;
}
