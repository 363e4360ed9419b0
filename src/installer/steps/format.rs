use chroot::{Execute, Request};
use disk_ops::{LayoutOptions, PlannedPartitions};
use disk_types::FileSystem;
use external::{
    logical_volume_path, lvcreate, mkfs, mkfs_efi, mkswap, pvcreate, vgcreate, LOGICAL_VOLUME,
    VOLUME_GROUP,
};
use std::{fmt, path::PathBuf, time::Duration};

/// A single command in the chain that creates the file systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    FormatEfi,
    FormatSwap,
    CreatePhysicalVolume,
    CreateVolumeGroup,
    CreateLogicalVolume,
    FormatRoot,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ProvisionStep::FormatEfi => "formatting the EFI partition",
            ProvisionStep::FormatSwap => "creating the swap area",
            ProvisionStep::CreatePhysicalVolume => "creating the LVM physical volume",
            ProvisionStep::CreateVolumeGroup => "creating the LVM volume group",
            ProvisionStep::CreateLogicalVolume => "creating the root logical volume",
            ProvisionStep::FormatRoot => "formatting the root file system",
        })
    }
}

#[cfg_attr(rustfmt, rustfmt_skip)]
#[derive(Debug, Fail)]
pub enum ProvisionError {
    #[fail(display = "{} is not supported as a root file system", fs)]
    UnsupportedRoot { fs: FileSystem },
    #[fail(display = "{} failed: {}", step, command)]
    StepFailed { step: ProvisionStep, command: String },
}

/// The commands that create the file systems on freshly planned partitions, and
/// the device which will hold the root file system once they have completed.
pub fn provisioning_steps(
    partitions: &PlannedPartitions,
    options: &LayoutOptions,
) -> Result<(Vec<(ProvisionStep, String)>, PathBuf), ProvisionError> {
    let root_fs = options.filesystem;
    let root_mkfs = |device: &PathBuf| match mkfs(device, root_fs) {
        Some(command) if root_fs.is_supported_root() => Ok(command),
        _ => Err(ProvisionError::UnsupportedRoot { fs: root_fs }),
    };

    let mut steps = vec![(ProvisionStep::FormatEfi, mkfs_efi(&partitions.efi))];

    if let Some(ref swap) = partitions.swap {
        steps.push((ProvisionStep::FormatSwap, mkswap(swap)));
    }

    let root = if options.use_lvm {
        let volume = logical_volume_path(VOLUME_GROUP, LOGICAL_VOLUME);
        steps.push((ProvisionStep::CreatePhysicalVolume, pvcreate(&partitions.root)));
        steps.push((ProvisionStep::CreateVolumeGroup, vgcreate(VOLUME_GROUP, &partitions.root)));
        steps.push((ProvisionStep::CreateLogicalVolume, lvcreate(VOLUME_GROUP, LOGICAL_VOLUME)));
        steps.push((ProvisionStep::FormatRoot, root_mkfs(&volume)?));
        volume
    } else {
        steps.push((ProvisionStep::FormatRoot, root_mkfs(&partitions.root)?));
        partitions.root.clone()
    };

    Ok((steps, root))
}

/// Creates the EFI, swap, and root file systems, returning the root device.
///
/// Steps run in order and the first failure ends the chain. Whatever was
/// created before the failure is left in place.
pub fn provision_filesystems<E: Execute + ?Sized, F: FnMut(i32)>(
    executor: &mut E,
    partitions: &PlannedPartitions,
    options: &LayoutOptions,
    timeout: Duration,
    mut callback: F,
) -> Result<PathBuf, ProvisionError> {
    let (steps, root) = provisioning_steps(partitions, options)?;
    info!(
        "creating file systems with {}{}",
        options.filesystem,
        if options.use_lvm { " on LVM" } else { "" }
    );

    let total = steps.len();
    for (id, (step, command)) in steps.into_iter().enumerate() {
        info!("{}", step);
        if !executor.run(&Request::new(command.as_str()).timeout(timeout)).succeeded {
            return Err(ProvisionError::StepFailed { step, command });
        }

        callback(((id + 1) * 100 / total) as i32);
    }

    info!("root file system is on {}", root.display());
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroot::{CommandResult, Failure};
    use std::path::Path;

    #[derive(Default)]
    struct Recorder {
        fail_on:  Option<&'static str>,
        commands: Vec<String>,
    }

    impl Execute for Recorder {
        fn run(&mut self, request: &Request) -> CommandResult {
            self.commands.push(request.command.clone());
            match self.fail_on {
                Some(prefix) if request.command.starts_with(prefix) => {
                    CommandResult::failed(Failure::Status(1), Vec::new())
                }
                _ => CommandResult::success(Vec::new()),
            }
        }
    }

    fn nvme(swap: bool) -> PlannedPartitions {
        PlannedPartitions {
            efi:  "/dev/nvme0n1p1".into(),
            swap: if swap { Some("/dev/nvme0n1p2".into()) } else { None },
            root: if swap { "/dev/nvme0n1p3".into() } else { "/dev/nvme0n1p2".into() },
        }
    }

    fn provision(
        recorder: &mut Recorder,
        partitions: &PlannedPartitions,
        options: &LayoutOptions,
    ) -> Result<PathBuf, ProvisionError> {
        provision_filesystems(recorder, partitions, options, Duration::from_secs(60), |_| ())
    }

    #[test]
    fn lvm_chain_with_swap() {
        let mut recorder = Recorder::default();
        let mut progress = Vec::new();
        let root = provision_filesystems(
            &mut recorder,
            &nvme(true),
            &LayoutOptions::default(),
            Duration::from_secs(60),
            |percent| progress.push(percent),
        )
        .unwrap();

        assert_eq!(root, Path::new("/dev/vg0/root"));
        assert_eq!(recorder.commands, vec![
            "mkfs.fat -F 32 /dev/nvme0n1p1",
            "mkswap -f /dev/nvme0n1p2",
            "pvcreate -ffy /dev/nvme0n1p3",
            "vgcreate -ffy vg0 /dev/nvme0n1p3",
            "lvcreate -y -l 100%FREE vg0 -n root",
            "mkfs.ext4 -F -q -E lazy_itable_init /dev/vg0/root",
        ]);
        assert_eq!(progress.last(), Some(&100));
        assert_eq!(progress.len(), 6);
    }

    #[test]
    fn plain_btrfs_without_swap() {
        let mut recorder = Recorder::default();
        let options = LayoutOptions {
            include_swap: false,
            use_lvm: false,
            filesystem: FileSystem::Btrfs,
            ..Default::default()
        };

        let root = provision(&mut recorder, &nvme(false), &options).unwrap();
        assert_eq!(root, Path::new("/dev/nvme0n1p2"));
        assert_eq!(recorder.commands, vec![
            "mkfs.fat -F 32 /dev/nvme0n1p1",
            "mkfs.btrfs -f /dev/nvme0n1p2",
        ]);
    }

    #[test]
    fn chain_stops_at_first_failure() {
        let mut recorder = Recorder { fail_on: Some("vgcreate"), ..Default::default() };
        match provision(&mut recorder, &nvme(true), &LayoutOptions::default()) {
            Err(ProvisionError::StepFailed { step, .. }) => {
                assert_eq!(step, ProvisionStep::CreateVolumeGroup)
            }
            other => panic!("expected the volume group to fail, got {:?}", other),
        }

        assert_eq!(recorder.commands.len(), 4);
        assert!(!recorder.commands.iter().any(|cmd| cmd.starts_with("lvcreate")));
    }

    #[test]
    fn failed_efi_format_names_the_step() {
        let mut recorder = Recorder { fail_on: Some("mkfs.fat"), ..Default::default() };
        let why = provision(&mut recorder, &nvme(true), &LayoutOptions::default()).unwrap_err();
        assert_eq!(
            format!("{}", why),
            "formatting the EFI partition failed: mkfs.fat -F 32 /dev/nvme0n1p1"
        );
        assert_eq!(recorder.commands.len(), 1);
    }

    #[test]
    fn unsupported_root_runs_nothing() {
        let mut recorder = Recorder::default();
        let options = LayoutOptions { filesystem: FileSystem::Xfs, ..Default::default() };
        match provision(&mut recorder, &nvme(true), &options) {
            Err(ProvisionError::UnsupportedRoot { fs }) => assert_eq!(fs, FileSystem::Xfs),
            other => panic!("expected an unsupported root, got {:?}", other),
        }

        assert!(recorder.commands.is_empty());
    }
}
