// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod cli;
pub mod config;
pub mod error;
pub mod imaging;
pub mod pipeline;
pub mod utils;

pub use cli::{ArgValues, LinePrompter, Prompter, SettingsResolver, TerminalPrompter};
pub use config::{
    Config, DefaultsConfig, EnhanceConfig, MattingConfig, OutputConfig, ProgressConfig,
};
pub use error::{ProcessingError, Result, StageError};
pub use imaging::{
    BackgroundRemover, BorderMatte, ImageBackend, Matting, ModelKind, ModelMatte, PngCompression,
    Segmenter, StandardBackend,
};
pub use pipeline::{
    CancelFlag, Executor, Mode, NoOpProgress, Plan, ProgressEvent, ProgressSink, ProgressStyle,
    RunRequest, RunSummary, Scale, Stage, plan,
};
pub use utils::{StageTimer, StageTiming, Validator};
