mod time_tracking;

pub use time_tracking::*;
