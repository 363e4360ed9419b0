use super::ProvisionError;
use crate::{Config, InstallError, Partitioning};
use std::path::Path;

fn require(role: &'static str, path: &Path) -> Result<(), InstallError> {
    if path.as_os_str().is_empty() {
        error!("config: no {} partition was given", role);
        Err(InstallError::EmptyPartitionPath { role })
    } else {
        Ok(())
    }
}

/// Validates the configuration before anything on the system is modified.
pub fn initialize<F: FnMut(i32)>(config: &Config, mut callback: F) -> Result<(), InstallError> {
    info!(
        "installing to {} with a command timeout of {}s",
        config.mount_root.display(),
        config.timeout.as_secs()
    );

    match config.partitioning {
        Partitioning::Automatic { ref device, ref options } => {
            if device.as_os_str().is_empty() {
                return Err(InstallError::NoDevice);
            }

            if !options.filesystem.is_supported_root() {
                return Err(ProvisionError::UnsupportedRoot { fs: options.filesystem }.into());
            }

            if options.include_swap && options.swap_mib == 0 {
                return Err(InstallError::EmptySwap);
            }

            info!(
                "automatic layout on {}: {} root, lvm: {}, swap: {}",
                device.display(),
                options.filesystem,
                options.use_lvm,
                if options.include_swap { format!("{} MiB", options.swap_mib) } else { "no".into() }
            );
        }
        Partitioning::Manual { ref efi, ref swap, ref root } => {
            require("EFI", efi)?;
            require("root", root)?;
            if let Some(ref swap) = *swap {
                require("swap", swap)?;
            }

            info!("using existing partitions: efi {}, root {}", efi.display(), root.display());
        }
    }

    callback(100);
    Ok(())
}
