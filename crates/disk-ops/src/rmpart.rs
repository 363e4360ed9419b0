use chroot::quote;
use std::path::Path;

/// Removes the partition on a block device by its number.
pub fn sfdisk_delete<P: AsRef<Path>>(device: P, number: u32) -> String {
    format!("sfdisk --delete {} {}", quote(&device.as_ref().to_string_lossy()), number)
}
