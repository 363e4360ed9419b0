use std::{fmt, str::FromStr};

/// Describes a file system format, such as ext4 or fat32.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum FileSystem {
    Btrfs,
    Exfat,
    Ext2,
    Ext3,
    Ext4,
    F2fs,
    Fat16,
    Fat32,
    Ntfs,
    Swap,
    Xfs,
    Luks,
    Lvm,
}

impl FileSystem {
    /// File systems which, when found on a partition, mark it as holding Linux data.
    pub const LINUX: [FileSystem; 4] =
        [FileSystem::Ext4, FileSystem::Xfs, FileSystem::Btrfs, FileSystem::F2fs];

    pub fn is_linux(self) -> bool { Self::LINUX.contains(&self) }

    /// True for the file systems that may be chosen for the installed root.
    pub fn is_supported_root(self) -> bool {
        match self {
            FileSystem::Ext4 | FileSystem::Btrfs => true,
            _ => false,
        }
    }
}

impl FromStr for FileSystem {
    type Err = &'static str;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let type_ = match string.to_lowercase().as_str() {
            "btrfs" => FileSystem::Btrfs,
            "exfat" => FileSystem::Exfat,
            "ext2" => FileSystem::Ext2,
            "ext3" => FileSystem::Ext3,
            "ext4" => FileSystem::Ext4,
            "f2fs" => FileSystem::F2fs,
            "fat16" => FileSystem::Fat16,
            "fat32" | "vfat" => FileSystem::Fat32,
            "swap" | "linux-swap(v1)" => FileSystem::Swap,
            "ntfs" => FileSystem::Ntfs,
            "xfs" => FileSystem::Xfs,
            "lvm" | "lvm2_member" => FileSystem::Lvm,
            "luks" | "crypto_luks" => FileSystem::Luks,
            _ => return Err("invalid file system name"),
        };
        Ok(type_)
    }
}

impl From<FileSystem> for &'static str {
    fn from(val: FileSystem) -> Self {
        match val {
            FileSystem::Btrfs => "btrfs",
            FileSystem::Exfat => "exfat",
            FileSystem::Ext2 => "ext2",
            FileSystem::Ext3 => "ext3",
            FileSystem::Ext4 => "ext4",
            FileSystem::F2fs => "f2fs",
            FileSystem::Fat16 => "fat16",
            FileSystem::Fat32 => "fat32",
            FileSystem::Ntfs => "ntfs",
            FileSystem::Swap => "swap",
            FileSystem::Xfs => "xfs",
            FileSystem::Lvm => "lvm",
            FileSystem::Luks => "luks",
        }
    }
}

impl fmt::Display for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let str: &'static str = (*self).into();
        f.write_str(str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lsblk_names() {
        assert_eq!("vfat".parse::<FileSystem>(), Ok(FileSystem::Fat32));
        assert_eq!("LVM2_member".parse::<FileSystem>(), Ok(FileSystem::Lvm));
        assert_eq!("crypto_LUKS".parse::<FileSystem>(), Ok(FileSystem::Luks));
        assert_eq!("swap".parse::<FileSystem>(), Ok(FileSystem::Swap));
        assert!("apfs".parse::<FileSystem>().is_err());
        assert!("".parse::<FileSystem>().is_err());
    }

    #[test]
    fn linux_set() {
        for fs in &FileSystem::LINUX {
            assert!(fs.is_linux());
        }

        for fs in &[FileSystem::Ext2, FileSystem::Ext3, FileSystem::Fat32, FileSystem::Swap] {
            assert!(!fs.is_linux());
        }
    }

    #[test]
    fn root_file_systems() {
        assert!(FileSystem::Ext4.is_supported_root());
        assert!(FileSystem::Btrfs.is_supported_root());
        assert!(!FileSystem::Xfs.is_supported_root());
        assert!(!FileSystem::Fat32.is_supported_root());
    }
}
