mod fs;
mod partition;
mod parttype;

pub use self::{fs::*, partition::*, parttype::*};
