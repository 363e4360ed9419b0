use std::path::{Path, PathBuf};

/// Prefix which asks coreutils to line-buffer the standard streams of a command.
pub const LINE_BUFFERED: &str = "stdbuf -oL -eL";

/// Defines the target root that `arch-chroot` will enter to run commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Chroot {
    pub path: PathBuf,
}

impl Default for Chroot {
    fn default() -> Self { Chroot::new("/mnt") }
}

impl Chroot {
    pub fn new<P: AsRef<Path>>(path: P) -> Self { Chroot { path: path.as_ref().to_path_buf() } }

    /// Wraps `inner` so that it runs as a login shell inside the target root.
    ///
    /// The inner command is passed as a single quoted argument to `bash -lc`, so
    /// heredocs, pipes, and nested quoting reach the inner shell unmodified.
    pub fn wrap(&self, inner: &str) -> String {
        let inner = line_buffered(inner);
        let root = self.path.to_string_lossy();
        ["arch-chroot ", &quote(&root), " bash -lc ", &quote(&inner)].concat()
    }
}

/// Prefixes the command with `stdbuf`, unless it already asks for it.
pub fn line_buffered(command: &str) -> String {
    if command.trim_start().starts_with("stdbuf ") {
        command.to_owned()
    } else {
        [LINE_BUFFERED, " ", command].concat()
    }
}

/// Quotes a string for a POSIX shell, leaving it bare when that is safe.
pub fn quote(arg: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c);

    if arg.is_empty() {
        "''".into()
    } else if arg.chars().all(is_safe) {
        arg.into()
    } else {
        ["'", &arg.replace("'", "'\"'\"'"), "'"].concat()
    }
}
