mod clock;
mod memory;
mod session_file;

pub use clock::*;
pub use memory::*;
pub use session_file::*;
