//! Terminal rendering for the live dashboard and the one-shot console tables.

pub mod common;
pub mod console;
pub mod summary;
pub mod theme;

pub use theme::Theme;
