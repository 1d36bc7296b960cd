pub mod commands;
pub mod ui;

pub use ui::{ConsoleRenderer, Output};
