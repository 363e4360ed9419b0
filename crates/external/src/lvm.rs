use super::{command, quote_path};
use std::path::{Path, PathBuf};

/// The volume group created on the root partition.
pub const VOLUME_GROUP: &str = "vg0";
/// The logical volume which holds the root file system.
pub const LOGICAL_VOLUME: &str = "root";

/// Path of the device node for the `name` logical volume in `group`.
pub fn logical_volume_path(group: &str, name: &str) -> PathBuf {
    ["/dev", group, name].iter().collect()
}

/// Initializes a physical volume on `device`, wiping any previous signature.
pub fn pvcreate<P: AsRef<Path>>(device: P) -> String {
    command("pvcreate", &["-ffy"], &quote_path(device))
}

/// Creates the `group` volume group backed by `device`.
pub fn vgcreate<P: AsRef<Path>>(group: &str, device: P) -> String {
    command("vgcreate", &["-ffy", group], &quote_path(device))
}

/// Creates the `name` logical volume, spanning all free space in `group`.
pub fn lvcreate(group: &str, name: &str) -> String {
    command("lvcreate", &["-y", "-l", "100%FREE", group, "-n"], name)
}
