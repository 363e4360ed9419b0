use super::{Error, Installer, Status, Step};
use crate::{InstallError, KILL_SWITCH};
use libc;
use std::{sync::atomic::Ordering, time::Instant};

/// Tracks the step that is running, and reports its progress to the installer.
pub struct InstallerState<'a> {
    pub installer: &'a mut Installer,
    pub status:    Status,
}

impl<'a> InstallerState<'a> {
    pub fn new(installer: &'a mut Installer) -> Self {
        Self { installer, status: Status { step: Step::Init, percent: 0 } }
    }

    /// Runs one installation step.
    ///
    /// Nothing runs once `KILL_SWITCH` is raised. A step that succeeds always ends
    /// with a status of 100%, and a step that fails reports its error on that step.
    pub fn apply<T, F>(&mut self, step: Step, msg: &str, mut action: F) -> Result<T, InstallError>
    where
        F: for<'c> FnMut(&'c mut Self) -> Result<T, InstallError>,
    {
        // Flush what earlier steps wrote before touching the disks again.
        unsafe {
            libc::sync();
        }

        if KILL_SWITCH.load(Ordering::SeqCst) {
            warn!("cancelled before the {} step", msg);
            return Err(InstallError::Cancelled);
        }

        self.set_percent(step, 0);
        info!("starting {} step", msg);
        let start = Instant::now();

        match action(self) {
            Ok(value) => {
                info!("{} step finished in {:.1}s", msg, start.elapsed().as_secs_f64());
                if self.status.percent != 100 {
                    self.set_percent(step, 100);
                }
                Ok(value)
            }
            Err(err) => {
                error!("{} error: {}", msg, err);
                let error = Error { step: self.status.step, err };
                self.emit_error(&error);
                Err(error.err)
            }
        }
    }

    fn set_percent(&mut self, step: Step, percent: i32) {
        self.status = Status { step, percent };
        let status = self.status;
        self.emit_status(status);
    }

    pub fn emit_status(&mut self, status: Status) { self.installer.emit_status(status); }

    pub fn emit_error(&mut self, error: &Error) { self.installer.emit_error(error); }
}
