use disks::InspectError;
use std::path::PathBuf;

#[cfg_attr(rustfmt, rustfmt_skip)]
#[derive(Debug, Fail)]
pub enum PartitionError {
    #[fail(display = "no target device was specified")]
    NoDevice,
    #[fail(display = "unable to inspect {:?}: {}", device, why)]
    Inspect { device: PathBuf, why: InspectError },
    #[fail(display = "failed to write a new partition table to {:?}", device)]
    InitializeFailed { device: PathBuf },
    #[fail(display = "appending to {:?} failed, but it has no partitions to make room with; \
                      partition the whole drive instead", device)]
    NoExistingPartitions { device: PathBuf },
    #[fail(display = "not enough free space at the end of {:?}, and its last partition ({:?}) \
                      is not a Linux partition; refusing to delete it", device, partition)]
    UnsafeTrailing { device: PathBuf, partition: PathBuf },
    #[fail(display = "unable to get the partition number of {}", name)]
    NoPartitionNumber { name: String },
    #[fail(display = "failed to delete partition {} on {:?}", number, device)]
    DeleteFailed { device: PathBuf, number: u32 },
    #[fail(display = "appending partitions to {:?} failed even after deleting its last Linux \
                      partition", device)]
    RetryFailed { device: PathBuf },
    #[fail(display = "expected at least {} partitions on {:?}, but found {}", expected, device, found)]
    InsufficientPartitions { device: PathBuf, expected: usize, found: usize },
}
