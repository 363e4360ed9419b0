use crate::installer::ProvisionError;
use disk_ops::PartitionError;
use std::path::PathBuf;

#[cfg_attr(rustfmt, rustfmt_skip)]
#[derive(Debug, Fail)]
pub enum InstallError {
    #[fail(display = "no device was selected for automatic partitioning")]
    NoDevice,
    #[fail(display = "the swap partition needs a size larger than 0 MiB")]
    EmptySwap,
    #[fail(display = "the {} partition path is empty", role)]
    EmptyPartitionPath { role: &'static str },
    #[fail(display = "partitioning failed: {}", why)]
    Partition { why: PartitionError },
    #[fail(display = "formatting failed: {}", why)]
    Provision { why: ProvisionError },
    #[fail(display = "failed to mount the new system at {:?}", root)]
    MountFailed { root: PathBuf },
    #[fail(display = "failed to unmount the new system from {:?}", root)]
    UnmountFailed { root: PathBuf },
    #[fail(display = "the installation was cancelled")]
    Cancelled,
}

impl From<PartitionError> for InstallError {
    fn from(why: PartitionError) -> InstallError { InstallError::Partition { why } }
}

impl From<ProvisionError> for InstallError {
    fn from(why: ProvisionError) -> InstallError { InstallError::Provision { why } }
}
