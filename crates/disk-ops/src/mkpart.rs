use super::with_script;
use chroot::quote;
use std::path::Path;

/// Adds the partitions described by `script` after the last existing partition.
pub fn sfdisk_append<P: AsRef<Path>>(device: P, script: &str) -> String {
    let device = quote(&device.as_ref().to_string_lossy());
    with_script(&["sfdisk --append ", &device].concat(), script)
}
