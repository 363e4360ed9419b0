//! Command lines for the external programs which the installer drives.
//!
//! Every builder returns shell text for the command runner, with device paths
//! quoted for `sh -c`.

extern crate disk_types;
extern crate t2inst_chroot as chroot;

pub mod block;
pub mod lvm;
pub mod mount;

pub use self::{block::*, lvm::*, mount::*};

use std::path::Path;

fn quote_path<P: AsRef<Path>>(path: P) -> String {
    chroot::quote(&path.as_ref().to_string_lossy())
}

fn command(program: &str, args: &[&str], target: &str) -> String {
    let mut line = String::from(program);
    for arg in args.iter().chain(Some(&target)) {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
