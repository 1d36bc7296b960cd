mod output;
mod renderer;

pub use output::Output;
pub use renderer::{ConsoleRenderer, format_event};
