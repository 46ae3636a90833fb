pub mod app;
pub mod cli;
pub mod config;
pub mod render;
pub mod tui;

pub use app::*;
pub use cli::*;
pub use config::*;
pub use render::*;
pub use tui::*;
