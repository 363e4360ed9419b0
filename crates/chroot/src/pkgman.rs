use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Package managers whose interrupted transactions leave a lock file behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Pacman,
    Pacstrap,
}

impl PackageManager {
    pub const ALL: [PackageManager; 2] = [PackageManager::Pacman, PackageManager::Pacstrap];

    pub fn keyword(self) -> &'static str {
        match self {
            PackageManager::Pacman => "pacman",
            PackageManager::Pacstrap => "pacstrap",
        }
    }

    /// Finds the first package manager whose keyword appears in the command, ignoring case.
    pub fn detect(command: &str) -> Option<PackageManager> {
        let command = command.to_lowercase();
        Self::ALL.iter().cloned().find(|manager| command.contains(manager.keyword()))
    }
}

/// Recovery action for a package manager command that did not finish cleanly.
pub trait LockCleanup {
    fn cleanup(&mut self, manager: PackageManager) -> io::Result<()>;
}

/// Removes the pacman database lock from the target root.
#[derive(Debug, Clone)]
pub struct PacmanLock {
    root: PathBuf,
}

impl PacmanLock {
    pub const LOCK: &'static str = "var/lib/pacman/db.lck";

    pub fn new<P: AsRef<Path>>(root: P) -> Self { Self { root: root.as_ref().to_path_buf() } }

    pub fn path(&self) -> PathBuf { self.root.join(Self::LOCK) }
}

impl LockCleanup for PacmanLock {
    fn cleanup(&mut self, manager: PackageManager) -> io::Result<()> {
        let lock = self.path();
        info!("{} did not finish cleanly: removing {}", manager.keyword(), lock.display());
        match fs::remove_file(&lock) {
            Ok(()) => Ok(()),
            Err(ref why) if why.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(why) => Err(why),
        }
    }
}
