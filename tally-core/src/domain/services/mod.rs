mod accounting;
mod retainer;
mod time_tracking;
mod timer;

pub use accounting::*;
pub use retainer::*;
pub use time_tracking::*;
pub use timer::*;
