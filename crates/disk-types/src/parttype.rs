/// GPT type GUID of a Linux file system data partition.
pub const LINUX_FILESYSTEM_GUID: &str = "0fc63daf-8483-4772-8e79-3d69d8477de4";
/// GPT type GUID of an EFI System partition.
pub const EFI_SYSTEM_GUID: &str = "c12a7328-f81f-11d2-ba4b-00a0c93ec93b";
/// GPT type GUID of a Linux swap partition.
pub const LINUX_SWAP_GUID: &str = "0657fd6d-a4ab-43c4-84e5-0933c84b4f4f";
/// GPT type GUID of a Linux LVM physical volume.
pub const LINUX_LVM_GUID: &str = "e6d6d379-f507-44c2-a23c-238f2a3df928";

/// The role that a partition's type identifier assigns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    EfiSystem,
    LinuxFilesystem,
    LinuxSwap,
    LinuxLvm,
    Other,
}

impl PartitionKind {
    /// Classifies a GPT type GUID, a `gdisk` type code, or an MBR type byte.
    pub fn from_type_id(id: &str) -> PartitionKind {
        let id = id.trim().to_lowercase();
        match id.as_str() {
            LINUX_FILESYSTEM_GUID | "8300" | "83" | "0x83" => PartitionKind::LinuxFilesystem,
            EFI_SYSTEM_GUID | "ef00" | "ef" | "0xef" => PartitionKind::EfiSystem,
            LINUX_SWAP_GUID | "8200" | "82" | "0x82" => PartitionKind::LinuxSwap,
            LINUX_LVM_GUID | "8e00" | "8e" | "0x8e" => PartitionKind::LinuxLvm,
            _ => PartitionKind::Other,
        }
    }
}
