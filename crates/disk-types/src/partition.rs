use crate::{fs::FileSystem, parttype::PartitionKind};
use std::path::{Path, PathBuf};

/// Trait to provide methods for classifying a partition read from a block device.
pub trait PartitionExt {
    /// The kernel name of the partition, such as `nvme0n1p3`.
    fn get_device_name(&self) -> &str;

    /// The location of the partition's device node.
    fn get_device_path(&self) -> &Path;

    /// The GPT type GUID or MBR type code of the partition, if known.
    fn get_partition_type_id(&self) -> &str;

    /// The file system signature detected on the partition.
    fn get_file_system(&self) -> Option<FileSystem>;

    /// The byte offset where this partition begins on the parent block device.
    fn get_start(&self) -> u64;

    fn get_partition_kind(&self) -> PartitionKind {
        PartitionKind::from_type_id(self.get_partition_type_id())
    }

    /// True if the partition holds, or is typed to hold, Linux data.
    ///
    /// Partitions that fail this check may belong to another operating system, and
    /// must never be removed to make room for an installation.
    fn is_linux_compatible(&self) -> bool {
        self.get_partition_kind() == PartitionKind::LinuxFilesystem
            || self.get_file_system().map_or(false, FileSystem::is_linux)
    }

    /// The partition number, taken from the trailing digits of the kernel name.
    fn get_partition_number(&self) -> Option<u32> {
        let name = self.get_device_name();
        let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        name[name.len() - digits..].parse::<u32>().ok()
    }
}

/// A partition as currently found on a block device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub name:           String,
    pub device_path:    PathBuf,
    pub size:           u64,
    pub start:          u64,
    pub partition_type: String,
    pub filesystem:     String,
}

impl PartitionExt for Partition {
    fn get_device_name(&self) -> &str { &self.name }

    fn get_device_path(&self) -> &Path { &self.device_path }

    fn get_partition_type_id(&self) -> &str { &self.partition_type }

    fn get_file_system(&self) -> Option<FileSystem> { self.filesystem.parse().ok() }

    fn get_start(&self) -> u64 { self.start }
}

/// The device node of partition `number` on the block device at `device`.
///
/// When the device name ends with a digit, as `nvme0n1`, `mmcblk0`, and `loop0` do,
/// the kernel separates the partition number with a `p`.
pub fn partition_path<P: AsRef<Path>>(device: P, number: u32) -> PathBuf {
    let device = device.as_ref();
    let ends_in_digit = device
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.chars().last())
        .map_or(false, |last| last.is_ascii_digit());

    let mut path = device.as_os_str().to_owned();
    path.push(if ends_in_digit { format!("p{}", number) } else { number.to_string() });
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parttype::*;

    fn part(name: &str, partition_type: &str, filesystem: &str) -> Partition {
        Partition {
            name: name.into(),
            device_path: Path::new("/dev").join(name),
            size: 1 << 30,
            start: 1 << 20,
            partition_type: partition_type.into(),
            filesystem: filesystem.into(),
        }
    }

    #[test]
    fn linux_by_type() {
        assert!(part("sda2", LINUX_FILESYSTEM_GUID, "").is_linux_compatible());
        assert!(part("sda2", "8300", "").is_linux_compatible());
    }

    #[test]
    fn linux_by_file_system() {
        for fs in &["ext4", "xfs", "btrfs", "f2fs"] {
            assert!(part("sda2", "", fs).is_linux_compatible());
            assert!(part("sda2", "7c3457ef-0000-11aa-aa11-00306543ecac", fs).is_linux_compatible());
        }
    }

    #[test]
    fn foreign_partitions() {
        // An EFI partition without a recognized file system.
        assert!(!part("nvme0n1p1", EFI_SYSTEM_GUID, "").is_linux_compatible());
        assert!(!part("nvme0n1p1", EFI_SYSTEM_GUID, "vfat").is_linux_compatible());
        // Mac recovery volume.
        assert!(!part("nvme0n1p3", "7c3457ef-0000-11aa-aa11-00306543ecac", "apfs")
            .is_linux_compatible());
        assert!(!part("sda5", LINUX_SWAP_GUID, "swap").is_linux_compatible());
        assert!(!part("sda6", "", "ext3").is_linux_compatible());
        assert!(!part("sda7", "", "").is_linux_compatible());
    }

    #[test]
    fn classification_is_stable() {
        let partition = part("sda2", "", "btrfs");
        let verdict = partition.is_linux_compatible();
        for _ in 0..10 {
            assert_eq!(partition.clone().is_linux_compatible(), verdict);
        }
    }

    #[test]
    fn partition_numbers() {
        assert_eq!(part("nvme0n1p7", "", "").get_partition_number(), Some(7));
        assert_eq!(part("sda12", "", "").get_partition_number(), Some(12));
        assert_eq!(part("mmcblk0p2", "", "").get_partition_number(), Some(2));
        assert_eq!(part("sda", "", "").get_partition_number(), None);
        assert_eq!(part("", "", "").get_partition_number(), None);
    }

    #[test]
    fn partition_paths() {
        assert_eq!(partition_path("/dev/sda", 3), Path::new("/dev/sda3"));
        assert_eq!(partition_path("/dev/vda", 1), Path::new("/dev/vda1"));
        assert_eq!(partition_path("/dev/nvme0n1", 2), Path::new("/dev/nvme0n1p2"));
        assert_eq!(partition_path("/dev/mmcblk0", 1), Path::new("/dev/mmcblk0p1"));
        assert_eq!(partition_path("/dev/loop0", 12), Path::new("/dev/loop0p12"));
    }

    #[test]
    fn partition_paths_round_trip_to_numbers() {
        for device in &["/dev/sda", "/dev/nvme0n1", "/dev/loop7"] {
            let path = partition_path(device, 4);
            let name = path.file_name().unwrap().to_str().unwrap();
            assert_eq!(part(name, "", "").get_partition_number(), Some(4));
        }
    }
}
