use chroot::{run_all, Execute, Request};
use disk_ops::PlannedPartitions;
use external::{mkdir_all, mount, swapoff_all, swapon, umount_recursive};
use std::{path::Path, time::Duration};

/// Where the EFI partition is mounted, relative to the installation root.
pub const EFI_MOUNT: &str = "boot/efi";

/// Mounts the root and EFI partitions beneath `root`, and activates the swap area.
pub fn mount_commands(targets: &PlannedPartitions, root: &Path, timeout: Duration) -> Vec<Request> {
    let efi_mount = root.join(EFI_MOUNT);
    let mut commands = vec![
        mount(&targets.root, root),
        mkdir_all(&efi_mount),
        mount(&targets.efi, &efi_mount),
    ];

    if let Some(ref swap) = targets.swap {
        commands.push(swapon(swap));
    }

    commands.into_iter().map(|cmd| Request::new(cmd).timeout(timeout)).collect()
}

pub fn unmount_commands(root: &Path, timeout: Duration) -> Vec<Request> {
    vec![umount_recursive(root), swapoff_all()]
        .into_iter()
        .map(|cmd| Request::new(cmd).timeout(timeout))
        .collect()
}

pub fn mount_targets<E: Execute + ?Sized, F: FnMut(i32)>(
    executor: &mut E,
    targets: &PlannedPartitions,
    root: &Path,
    timeout: Duration,
    mut callback: F,
) -> bool {
    info!("mounting {} at {}", targets.root.display(), root.display());
    let mounted = run_all(executor, &mount_commands(targets, root, timeout));
    if mounted {
        callback(100);
    }

    mounted
}

pub fn unmount_targets<E: Execute + ?Sized>(
    executor: &mut E,
    root: &Path,
    timeout: Duration,
) -> bool {
    info!("unmounting everything beneath {}", root.display());
    run_all(executor, &unmount_commands(root, timeout))
}
