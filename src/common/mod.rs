//! Number formatting for signal messages and the sleep abstraction shared by
//! the fetch retry loop and the scheduler.

pub mod formatting;
pub mod time;

pub use formatting::*;
pub use time::*;
