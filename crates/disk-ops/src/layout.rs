use super::{sfdisk_append, sfdisk_initialize, LVM_TYPE};
use disk_types::{FileSystem, Partition};
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// Size of the EFI system partition.
pub const EFI_SIZE: &str = "1GiB";

/// What the user asked for from the automatic layout.
#[derive(Debug, Clone, Copy, PartialEq, SmartDefault)]
pub struct LayoutOptions {
    /// Create a swap partition between the EFI and root partitions.
    #[default = true]
    pub include_swap: bool,
    /// Size of the swap partition, in MiB.
    #[default = 4096]
    pub swap_mib:     u64,
    /// Put the root file system on an LVM logical volume.
    #[default = true]
    pub use_lvm:      bool,
    /// File system for the root partition, or the root logical volume.
    #[default(FileSystem::Ext4)]
    pub filesystem:   FileSystem,
}

impl LayoutOptions {
    /// The number of partitions that the layout adds to the device.
    pub fn partition_count(&self) -> usize { if self.include_swap { 3 } else { 2 } }
}

/// How the layout is written to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replace the partition table of an empty device.
    Initialize,
    /// Add partitions after those already on the device.
    Append,
}

/// The partition layout that will be written to a device.
#[derive(Debug, Clone, PartialEq, new)]
pub struct LayoutPlan {
    pub device:  PathBuf,
    pub mode:    Mode,
    pub options: LayoutOptions,
}

impl LayoutPlan {
    /// A device without partitions is initialized, and any other device is appended to.
    pub fn for_device<P: AsRef<Path>>(
        device: P,
        existing: &[Partition],
        options: LayoutOptions,
    ) -> Self {
        let mode = if existing.is_empty() { Mode::Initialize } else { Mode::Append };
        LayoutPlan::new(device.as_ref().to_path_buf(), mode, options)
    }

    /// The sfdisk lines for each partition, in on-disk order.
    pub fn partition_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("size={}, type=uefi", EFI_SIZE)];
        if self.options.include_swap {
            lines.push(format!("size={}MiB, type=swap", self.options.swap_mib));
        }

        lines.push(if self.options.use_lvm {
            format!("type={}", LVM_TYPE)
        } else {
            "type=linux".into()
        });

        lines
    }

    /// The sfdisk script, which only declares a label when initializing.
    pub fn script(&self) -> String {
        let lines = self.partition_lines();
        match self.mode {
            Mode::Initialize => Some("label: gpt".to_owned()).into_iter().chain(lines).join("\n"),
            Mode::Append => lines.iter().join("\n"),
        }
    }

    /// The shell command which writes this plan to the device.
    pub fn command(&self) -> String {
        match self.mode {
            Mode::Initialize => sfdisk_initialize(&self.device, &self.script()),
            Mode::Append => sfdisk_append(&self.device, &self.script()),
        }
    }

    /// The same layout, written after the existing partitions.
    pub fn appending(&self) -> Self { LayoutPlan { mode: Mode::Append, ..self.clone() } }
}
