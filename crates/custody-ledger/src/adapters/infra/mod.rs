//! Infrastructure Adapters

mod time;

pub use time::{LogicalClock, SystemTimeSource};
