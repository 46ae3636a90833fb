pub mod range_picker;
pub mod theme;

pub use range_picker::*;
pub use theme::*;
