// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod executor;
mod plan;
mod progress;

pub use executor::{CancelFlag, Executor, RunRequest, RunSummary};
pub use plan::{Mode, Plan, Scale, Stage, plan, plan_for_selector};
pub use progress::{
    BAR_WIDTH, BarProgress, ConsoleRenderer, LogProgress, NoOpProgress, ProgressEvent,
    ProgressSink, ProgressStyle, RecordingProgress, StageStatus, percent, render_bar,
    render_frame,
};
