use std::{io, path::PathBuf};

#[cfg_attr(rustfmt, rustfmt_skip)]
#[derive(Debug, Fail)]
pub enum InspectError {
    #[fail(display = "unable to run lsblk on {:?}: {}", device, why)]
    Spawn { device: PathBuf, why: io::Error },
    #[fail(display = "lsblk failed on {:?}: {}", device, stderr)]
    Status { device: PathBuf, stderr: String },
    #[fail(display = "unable to parse lsblk output for {:?}: {}", device, why)]
    Parse { device: PathBuf, why: serde_json::Error },
    #[fail(display = "lsblk did not report the device {:?}", device)]
    DeviceNotFound { device: PathBuf },
}
