// file: src/pipeline/progress.rs
// description: progress events, frame rendering and the sinks that display them
// reference: uses indicatif for progress bars and colored for the live console frame

use crate::pipeline::plan::Stage;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle as BarStyle};
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};
use tracing::{debug, info};

pub const BAR_WIDTH: usize = 50;

const CLEAR_SCREEN: &str = "\x1bc";

/// Snapshot reported before each stage starts, and once more on completion.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    pub step_index: usize,
    pub total_steps: usize,
    pub stages: &'a [Stage],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    InProgress,
    Pending,
}

impl StageStatus {
    pub fn marker(&self) -> &'static str {
        match self {
            StageStatus::Completed => "✔",
            StageStatus::InProgress => "➤",
            StageStatus::Pending => " ",
        }
    }
}

impl<'a> ProgressEvent<'a> {
    pub fn new(step_index: usize, stages: &'a [Stage]) -> Self {
        Self {
            step_index,
            total_steps: stages.len(),
            stages,
        }
    }

    pub fn percent(&self) -> usize {
        percent(self.step_index, self.total_steps)
    }

    pub fn status(&self, index: usize) -> StageStatus {
        match index.cmp(&self.step_index) {
            std::cmp::Ordering::Less => StageStatus::Completed,
            std::cmp::Ordering::Equal => StageStatus::InProgress,
            std::cmp::Ordering::Greater => StageStatus::Pending,
        }
    }

    pub fn current_stage(&self) -> Option<Stage> {
        self.stages.get(self.step_index).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.step_index >= self.total_steps
    }
}

/// `floor(step / total * 100)`, capped at 100; an empty run counts as 0%.
pub fn percent(step_index: usize, total_steps: usize) -> usize {
    if total_steps == 0 {
        return 0;
    }
    (step_index.min(total_steps) * 100) / total_steps
}

pub fn render_bar(percent: usize) -> String {
    let filled = (percent.min(100) / 2).min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Render one full frame: the bar line followed by one line per stage.
pub fn render_frame(event: &ProgressEvent<'_>, colored: bool) -> String {
    let percent = event.percent();
    let mut frame = format!("[{}] {}%\n", render_bar(percent), percent);

    for (index, stage) in event.stages.iter().enumerate() {
        let status = event.status(index);
        let line = format!("{} {}", status.marker(), stage.name());
        let line = if colored {
            match status {
                StageStatus::Completed => line.green().to_string(),
                StageStatus::InProgress => line.cyan().bold().to_string(),
                StageStatus::Pending => line.dimmed().to_string(),
            }
        } else {
            line
        };
        frame.push_str(&line);
        frame.push('\n');
    }

    frame
}

/// Receives one event per stage boundary, in increasing order.
pub trait ProgressSink {
    fn on_event(&mut self, event: &ProgressEvent<'_>);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        (**self).on_event(event)
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        (**self).on_event(event)
    }
}

/// Which sink the binary builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStyle {
    #[default]
    Console,
    Bar,
    Log,
    Off,
}

impl ProgressStyle {
    pub fn build(self, colored: bool) -> Box<dyn ProgressSink> {
        match self {
            ProgressStyle::Console => Box::new(ConsoleRenderer::stdout(colored)),
            ProgressStyle::Bar => Box::new(BarProgress::new(colored)),
            ProgressStyle::Log => Box::new(LogProgress),
            ProgressStyle::Off => Box::new(NoOpProgress),
        }
    }
}

/// Clears the terminal and redraws the whole frame on every event.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    colored: bool,
    clear: bool,
}

impl ConsoleRenderer<io::Stdout> {
    /// Frames are appended rather than cleared when stdout is not a terminal.
    pub fn stdout(colored: bool) -> Self {
        let renderer = Self::new(io::stdout(), colored);
        if io::stdout().is_terminal() {
            renderer
        } else {
            renderer.without_clear()
        }
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self {
            out,
            colored,
            clear: true,
        }
    }

    /// Append frames instead of clearing between them.
    pub fn without_clear(mut self) -> Self {
        self.clear = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, event: &ProgressEvent<'_>) -> io::Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        self.out
            .write_all(render_frame(event, self.colored).as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write> ProgressSink for ConsoleRenderer<W> {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        if let Err(e) = self.draw(event) {
            debug!("Progress frame not drawn: {}", e);
        }
    }
}

/// Single indicatif bar with the current stage as its message.
pub struct BarProgress {
    bar: Option<ProgressBar>,
    colored: bool,
}

impl BarProgress {
    pub fn new(colored: bool) -> Self {
        Self { bar: None, colored }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            bar: Some(ProgressBar::hidden()),
            colored: false,
        }
    }

    fn bar_for(&mut self, total: usize) -> &ProgressBar {
        let colored = self.colored;
        let bar = self
            .bar
            .get_or_insert_with(|| create_progress_bar(total as u64, colored));
        bar.set_length(total as u64);
        bar
    }
}

impl ProgressSink for BarProgress {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        let bar = self.bar_for(event.total_steps);
        bar.set_position(event.step_index as u64);
        match event.current_stage() {
            Some(stage) => bar.set_message(stage.name()),
            None => bar.finish_with_message("Processing complete"),
        }
    }
}

fn create_progress_bar(total: u64, colored: bool) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let template = if colored {
        "{spinner:.green} [{elapsed_precise}] [{bar:50.cyan/blue}] {percent}% {msg}"
    } else {
        "{spinner} [{elapsed_precise}] [{bar:50}] {percent}% {msg}"
    };
    match BarStyle::default_bar().template(template) {
        Ok(style) => bar.set_style(style.progress_chars("#>-")),
        Err(e) => debug!("Falling back to default bar style: {}", e),
    }
    bar
}

/// One log line per stage boundary.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        match event.current_stage() {
            Some(stage) => info!(
                "[{}/{}] {} ({}%)",
                event.step_index + 1,
                event.total_steps,
                stage,
                event.percent()
            ),
            None => info!("[{0}/{0}] done (100%)", event.total_steps),
        }
    }
}

pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    #[inline(always)]
    fn on_event(&mut self, _event: &ProgressEvent<'_>) {}
}

/// Keeps every `(step_index, total_steps)` pair it sees; used by tests and embedders.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub events: Vec<(usize, usize)>,
    pub names: Vec<Vec<&'static str>>,
}

impl ProgressSink for RecordingProgress {
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        self.events.push((event.step_index, event.total_steps));
        self.names
            .push(event.stages.iter().map(Stage::name).collect());
    }
}
