pub mod display;
pub mod files;

pub use display::*;
