use super::{command, quote_path};
use std::path::Path;

pub fn mount<S: AsRef<Path>, T: AsRef<Path>>(source: S, target: T) -> String {
    let source = quote_path(source);
    command("mount", &[source.as_str()], &quote_path(target))
}

pub fn mkdir_all<P: AsRef<Path>>(path: P) -> String { command("mkdir", &["-p"], &quote_path(path)) }

pub fn swapon<P: AsRef<Path>>(device: P) -> String { command("swapon", &[], &quote_path(device)) }

/// Unmounts `target` along with everything mounted beneath it.
pub fn umount_recursive<P: AsRef<Path>>(target: P) -> String {
    command("umount", &["-R"], &quote_path(target))
}

pub fn swapoff_all() -> String { "swapoff -a".into() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_commands() {
        assert_eq!(mount("/dev/vg0/root", "/mnt"), "mount /dev/vg0/root /mnt");
        assert_eq!(mkdir_all("/mnt/boot/efi"), "mkdir -p /mnt/boot/efi");
        assert_eq!(swapon("/dev/sda2"), "swapon /dev/sda2");
        assert_eq!(umount_recursive("/mnt"), "umount -R /mnt");
        assert_eq!(swapoff_all(), "swapoff -a");
    }
}
