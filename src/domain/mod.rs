pub mod calendar;
pub mod date_range;
pub mod employee;
pub mod pto;
pub mod roster;

pub use calendar::*;
pub use date_range::*;
pub use employee::*;
pub use pto::*;
pub use roster::*;
