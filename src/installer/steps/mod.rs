mod format;
mod initialize;
mod mount;
mod partition;

pub use self::{format::*, initialize::*, mount::*, partition::*};

/// Installation step
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    Init,
    Partition,
    Format,
    Mount,
}
