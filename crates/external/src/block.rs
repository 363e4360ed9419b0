use self::FileSystem::*;
use super::{command, quote_path};
use disk_types::FileSystem;
use std::path::Path;

/// The formatting program and its arguments for each file system the installer creates.
pub fn mkfs_command(kind: FileSystem) -> Option<(&'static str, &'static [&'static str])> {
    let cmd: (&'static str, &'static [&'static str]) = match kind {
        Btrfs => ("mkfs.btrfs", &["-f"]),
        Ext4 => ("mkfs.ext4", &["-F", "-q", "-E", "lazy_itable_init"]),
        Fat32 => ("mkfs.fat", &["-F", "32"]),
        Swap => ("mkswap", &["-f"]),
        _ => return None,
    };

    Some(cmd)
}

/// Formats the supplied `part` device with the file system specified.
///
/// Returns `None` for kinds which the installer never creates.
pub fn mkfs<P: AsRef<Path>>(part: P, kind: FileSystem) -> Option<String> {
    mkfs_command(kind).map(|(cmd, args)| command(cmd, args, &quote_path(part)))
}

/// Formats an EFI system partition as FAT32.
pub fn mkfs_efi<P: AsRef<Path>>(part: P) -> String {
    command("mkfs.fat", &["-F", "32"], &quote_path(part))
}

pub fn mkswap<P: AsRef<Path>>(part: P) -> String {
    command("mkswap", &["-f"], &quote_path(part))
}
