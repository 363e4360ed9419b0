use super::{sfdisk_delete, LayoutOptions, LayoutPlan, Mode, PartitionError};
use chroot::{Execute, Request, DEFAULT_TIMEOUT};
use disk_types::{Partition, PartitionExt};
use disks::Inspect;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// The partitions which an installation is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPartitions {
    pub efi:  PathBuf,
    pub swap: Option<PathBuf>,
    /// The partition that holds the root file system, or its LVM physical volume.
    pub root: PathBuf,
}

impl PlannedPartitions {
    /// Takes the newest partitions from the end of the device.
    fn from_trailing(
        device: &Path,
        partitions: &[Partition],
        options: &LayoutOptions,
    ) -> Result<Self, PartitionError> {
        let expected = options.partition_count();
        if partitions.len() < expected {
            return Err(PartitionError::InsufficientPartitions {
                device: device.to_path_buf(),
                expected,
                found: partitions.len(),
            });
        }

        let new = &partitions[partitions.len() - expected..];
        Ok(PlannedPartitions {
            efi:  new[0].device_path.clone(),
            swap: if options.include_swap { Some(new[1].device_path.clone()) } else { None },
            root: new[expected - 1].device_path.clone(),
        })
    }
}

/// Decides how the automatic layout fits on a device, and applies it.
///
/// A device without partitions is given a fresh GPT table. Otherwise the layout is
/// appended, and if there is not enough room at the end of the device, the last
/// partition is deleted and the append is tried once more. The last partition is
/// only deleted when it holds Linux data.
pub struct Planner<'a, I: Inspect + ?Sized, E: Execute + ?Sized> {
    inspector: &'a I,
    executor:  &'a mut E,
    timeout:   Duration,
}

impl<'a, I: Inspect + ?Sized, E: Execute + ?Sized> Planner<'a, I, E> {
    pub fn new(inspector: &'a I, executor: &'a mut E) -> Self {
        Planner { inspector, executor, timeout: DEFAULT_TIMEOUT }
    }

    /// Limits how long each partitioning command may run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn apply(
        &mut self,
        device: &Path,
        options: &LayoutOptions,
    ) -> Result<PlannedPartitions, PartitionError> {
        if device.as_os_str().is_empty() {
            return Err(PartitionError::NoDevice);
        }

        let existing = self.inspect(device)?;
        let plan = LayoutPlan::for_device(device, &existing, *options);
        info!(
            "{} partitions found on {}: {:?} mode",
            existing.len(),
            device.display(),
            plan.mode
        );

        match plan.mode {
            Mode::Initialize => {
                info!("creating a new partition table on {}", device.display());
                if !self.run(&plan.command()) {
                    return Err(PartitionError::InitializeFailed { device: device.to_path_buf() });
                }
            }
            Mode::Append => {
                info!("adding partitions at the end of {}", device.display());
                if !self.run(&plan.command()) {
                    warn!("unable to append partitions to {}", device.display());
                    self.make_room(device)?;

                    info!("retrying to add partitions at the end of {}", device.display());
                    if !self.run(&plan.appending().command()) {
                        return Err(PartitionError::RetryFailed { device: device.to_path_buf() });
                    }
                }
            }
        }

        let partitions = self.inspect(device)?;
        let planned = PlannedPartitions::from_trailing(device, &partitions, options)?;
        info!(
            "partitioned {}: efi {}, swap {}, root {}",
            device.display(),
            planned.efi.display(),
            planned.swap.as_ref().map_or("none".into(), |swap| swap.display().to_string()),
            planned.root.display()
        );

        Ok(planned)
    }

    /// Deletes the last partition on the device, if it is safe to do so.
    fn make_room(&mut self, device: &Path) -> Result<(), PartitionError> {
        let partitions = self.inspect(device)?;
        let last = partitions.last().ok_or_else(|| PartitionError::NoExistingPartitions {
            device: device.to_path_buf(),
        })?;

        if !last.is_linux_compatible() {
            error!(
                "last partition {} (type '{}', fs '{}') is not a Linux partition",
                last.name, last.partition_type, last.filesystem
            );
            return Err(PartitionError::UnsafeTrailing {
                device:    device.to_path_buf(),
                partition: last.device_path.clone(),
            });
        }

        let number = last
            .get_partition_number()
            .ok_or_else(|| PartitionError::NoPartitionNumber { name: last.name.clone() })?;

        info!("deleting the last Linux partition, {}", last.device_path.display());
        if !self.run(&sfdisk_delete(device, number)) {
            return Err(PartitionError::DeleteFailed { device: device.to_path_buf(), number });
        }

        Ok(())
    }

    fn inspect(&self, device: &Path) -> Result<Vec<Partition>, PartitionError> {
        self.inspector
            .list_partitions(device)
            .map_err(|why| PartitionError::Inspect { device: device.to_path_buf(), why })
    }

    fn run(&mut self, command: &str) -> bool {
        self.executor.run(&Request::new(command).timeout(self.timeout)).succeeded
    }
}
