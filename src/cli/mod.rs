// file: src/cli/mod.rs
// description: command-line parameter resolution and interactive prompts
// reference: internal module structure

pub mod prompt;
pub mod settings;

pub use prompt::{LinePrompter, Prompter, TerminalPrompter};
pub use settings::{ArgValues, SettingsResolver};
