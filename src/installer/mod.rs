mod state;

pub(crate) mod steps;

pub use self::steps::{ProvisionError, ProvisionStep, Step};

use self::state::InstallerState;
use crate::{InstallError, KILL_SWITCH};
use chroot::{Chroot, CommandResult, Execute, Runner, DEFAULT_TIMEOUT};
use disk_ops::{LayoutOptions, PartitionError, PlannedPartitions};
use disks::{Inspect, Lsblk};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

macro_rules! percent {
    ($steps:expr) => {
        |percent| {
            $steps.status.percent = percent;
            let status = $steps.status;
            $steps.emit_status(status);
        }
    };
}

/// How the partitions of the new system are obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Partitioning {
    /// Write the automatic layout to a device, then create its file systems.
    Automatic { device: PathBuf, options: LayoutOptions },
    /// Use partitions which have already been created and formatted.
    Manual { efi: PathBuf, swap: Option<PathBuf>, root: PathBuf },
}

/// Installer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where the new system is mounted, and the root that chroot commands enter.
    pub mount_root:   PathBuf,
    /// How long any single external command may run.
    pub timeout:      Duration,
    pub partitioning: Partitioning,
}

impl Config {
    pub fn new(partitioning: Partitioning) -> Self {
        Config { mount_root: PathBuf::from("/mnt"), timeout: DEFAULT_TIMEOUT, partitioning }
    }
}

impl Default for Config {
    /// Mounts at `/mnt`, with no target device selected yet.
    fn default() -> Self {
        Config::new(Partitioning::Automatic {
            device:  PathBuf::new(),
            options: LayoutOptions::default(),
        })
    }
}

/// Installer error
#[derive(Debug)]
pub struct Error {
    pub step: Step,
    pub err:  InstallError,
}

/// Installer status
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Status {
    pub step:    Step,
    pub percent: i32,
}

type LineSink = Option<Box<dyn FnMut(&str)>>;

/// An installer object
#[derive(Default)]
pub struct Installer {
    error_cb:  Option<Box<dyn FnMut(&Error)>>,
    status_cb: Option<Box<dyn FnMut(&Status)>>,
    output_cb: LineSink,
}

impl Installer {
    /// Partitions, formats, and mounts the new system as described by `config`.
    ///
    /// Commands run on the host, stream their output to the output callback, and
    /// are killed when `KILL_SWITCH` is raised.
    pub fn install(&mut self, config: &Config) -> Result<(), InstallError> {
        let mut sink = self.output_cb.take();
        let result = {
            let mut runner = runner(config, &mut sink);
            self.install_with(config, &Lsblk, &mut runner)
        };

        self.output_cb = sink;
        result
    }

    /// Performs the installation with the given inspector and command executor.
    pub fn install_with<I: Inspect + ?Sized, E: Execute + ?Sized>(
        &mut self,
        config: &Config,
        inspector: &I,
        executor: &mut E,
    ) -> Result<(), InstallError> {
        debug!("installing with {:#?}", config);
        let steps = &mut InstallerState::new(self);

        steps.apply(Step::Init, "initializing", |steps| {
            steps::initialize(config, percent!(steps))
        })?;

        let targets = match config.partitioning {
            Partitioning::Automatic { ref device, ref options } => {
                let planned = steps.apply(Step::Partition, "partitioning", |steps| {
                    steps::partition(
                        inspector,
                        executor,
                        device,
                        options,
                        config.timeout,
                        percent!(steps),
                    )
                    .map_err(InstallError::from)
                })?;

                let root = steps.apply(Step::Format, "formatting", |steps| {
                    steps::provision_filesystems(
                        executor,
                        &planned,
                        options,
                        config.timeout,
                        percent!(steps),
                    )
                    .map_err(InstallError::from)
                })?;

                PlannedPartitions { root, ..planned }
            }
            Partitioning::Manual { ref efi, ref swap, ref root } => {
                PlannedPartitions { efi: efi.clone(), swap: swap.clone(), root: root.clone() }
            }
        };

        steps.apply(Step::Mount, "mounting", |steps| {
            let root = &config.mount_root;
            if steps::mount_targets(executor, &targets, root, config.timeout, percent!(steps)) {
                Ok(())
            } else {
                Err(InstallError::MountFailed { root: root.clone() })
            }
        })?;

        info!("the new system is mounted at {}", config.mount_root.display());
        Ok(())
    }

    /// Runs a command on the host, streaming its output to the output callback.
    pub fn execute(&mut self, config: &Config, command: &str) -> CommandResult {
        self.with_runner(config, |runner| runner.execute(command, config.timeout))
    }

    /// Runs a command inside the installation root with `arch-chroot`.
    pub fn execute_in_root(&mut self, config: &Config, command: &str) -> CommandResult {
        self.with_runner(config, |runner| runner.execute_in_root(command, config.timeout))
    }

    /// Writes the automatic layout to `device`, returning the EFI, swap, and root
    /// partitions that were created for the installation.
    pub fn plan_and_apply_partitions(
        &mut self,
        config: &Config,
        device: &Path,
        options: &LayoutOptions,
    ) -> Result<PlannedPartitions, PartitionError> {
        self.with_runner(config, |runner| {
            steps::partition(&Lsblk, runner, device, options, config.timeout, |_| ())
        })
    }

    /// Creates the file systems on planned partitions, returning the root device.
    pub fn provision_filesystems(
        &mut self,
        config: &Config,
        partitions: &PlannedPartitions,
        options: &LayoutOptions,
    ) -> Result<PathBuf, ProvisionError> {
        self.with_runner(config, |runner| {
            steps::provision_filesystems(runner, partitions, options, config.timeout, |_| ())
        })
    }

    /// Unmounts the installation root, and disables all swap areas.
    pub fn unmount(&mut self, config: &Config) -> Result<(), InstallError> {
        let root = &config.mount_root;
        if self.with_runner(config, |runner| steps::unmount_targets(runner, root, config.timeout)) {
            Ok(())
        } else {
            Err(InstallError::UnmountFailed { root: root.clone() })
        }
    }

    /// Send an error message
    pub fn emit_error(&mut self, error: &Error) {
        if let Some(ref mut cb) = self.error_cb {
            cb(error);
        }
    }

    /// Set the error callback
    ///
    /// ```ignore,rust
    /// use t2inst::Installer;
    /// let mut installer = Installer::default();
    /// installer.on_error(|error| println!("{:?}", error));
    /// ```
    pub fn on_error<F: FnMut(&Error) + 'static>(&mut self, callback: F) {
        self.error_cb = Some(Box::new(callback));
    }

    /// Send a status message
    pub fn emit_status(&mut self, status: Status) {
        if let Some(ref mut cb) = self.status_cb {
            cb(&status);
        }
    }

    /// Set the status callback
    pub fn on_status<F: FnMut(&Status) + 'static>(&mut self, callback: F) {
        self.status_cb = Some(Box::new(callback));
    }

    /// Set the callback which receives each line of output from external commands.
    ///
    /// Without one, output lines are logged.
    pub fn on_output<F: FnMut(&str) + 'static>(&mut self, callback: F) {
        self.output_cb = Some(Box::new(callback));
    }

    fn with_runner<T, F: FnOnce(&mut Runner) -> T>(&mut self, config: &Config, func: F) -> T {
        let mut sink = self.output_cb.take();
        let result = func(&mut runner(config, &mut sink));
        self.output_cb = sink;
        result
    }
}

fn runner<'a>(config: &Config, sink: &'a mut LineSink) -> Runner<'a> {
    Runner::new(Chroot::new(&config.mount_root)).cancel_on(&KILL_SWITCH).on_line(
        move |line: &str| match sink.as_mut() {
            Some(callback) => callback(line),
            None => info!("{}", line),
        },
    )
}
