//! Plans the partition layout of a target device, and applies it with `sfdisk`.

#[macro_use]
extern crate derive_new;
extern crate disk_types;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate itertools;
#[macro_use]
extern crate log;
#[macro_use]
extern crate smart_default;
extern crate t2inst_chroot as chroot;
extern crate t2inst_disks as disks;

mod error;
mod layout;
mod mklabel;
mod mkpart;
mod ops;
mod rmpart;

pub use self::{error::*, layout::*, mklabel::*, mkpart::*, ops::*, rmpart::*};

/// GPT type GUID that sfdisk is given for the LVM physical volume.
pub const LVM_TYPE: &str = "E6D6D379-F507-44C2-A23C-238F2A3DF928";

const HEREDOC: &str = "EOF";

/// Feeds `script` to `command` through a quoted heredoc.
fn with_script(command: &str, script: &str) -> String {
    [command, " <<'", HEREDOC, "'\n", script, "\n", HEREDOC].concat()
}
