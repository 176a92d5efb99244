//! Terminal interaction: progress display and interactive prompts

mod progress;
mod prompt;

pub use progress::ProgressReporter;
pub use prompt::ConsolePrompt;
