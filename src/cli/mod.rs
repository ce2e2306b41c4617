pub mod commands;
pub mod progress;
pub mod ui;
pub mod util;

pub use progress::{ConsoleRenderer, ProgressEvent, ProgressState, ProgressTracker};
pub use util::CommandContext;
