//! Convenience wrapper for executing shell commands with live output, process-group
//! control, and `arch-chroot` support.

#[macro_use]
extern crate cascade;
#[macro_use]
extern crate log;

extern crate libc;

mod chroot;
mod command;
mod decoder;
mod pkgman;
mod sequence;

pub use self::chroot::*;
pub use self::command::*;
pub use self::decoder::LineDecoder;
pub use self::pkgman::*;
pub use self::sequence::*;
