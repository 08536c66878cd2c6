mod accounting;
mod budget;
mod ids;
mod project;
mod time_entry;
mod timer;

pub use accounting::*;
pub use budget::*;
pub use ids::*;
pub use project::*;
pub use time_entry::*;
pub use timer::*;
