use super::with_script;
use chroot::quote;
use std::path::Path;

/// Wipes every signature on the device and writes a new table from `script`.
pub fn sfdisk_initialize<P: AsRef<Path>>(device: P, script: &str) -> String {
    let device = quote(&device.as_ref().to_string_lossy());
    with_script(&["sfdisk --wipe always ", &device].concat(), script)
}
