use chroot::Execute;
use disk_ops::{LayoutOptions, PartitionError, Planner, PlannedPartitions};
use disks::Inspect;
use std::{path::Path, time::Duration};

/// Writes the automatic layout to `device`, and returns the partitions it created.
pub fn partition<I, E, F>(
    inspector: &I,
    executor: &mut E,
    device: &Path,
    options: &LayoutOptions,
    timeout: Duration,
    mut callback: F,
) -> Result<PlannedPartitions, PartitionError>
where
    I: Inspect + ?Sized,
    E: Execute + ?Sized,
    F: FnMut(i32),
{
    let planned = Planner::new(inspector, executor).timeout(timeout).apply(device, options)?;
    callback(100);
    Ok(planned)
}
