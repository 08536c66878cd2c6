mod clock;
mod data_service;
mod session_slot;

pub use clock::*;
pub use data_service::*;
pub use session_slot::*;
