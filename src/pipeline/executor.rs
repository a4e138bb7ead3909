// file: src/pipeline/executor.rs
// description: runs a planned stage sequence over one image with progress reporting
// reference: sequential stage execution with a single terminal error per run

use crate::config::{Config, EnhanceConfig};
use crate::error::{ProcessingError, Result, StageError};
use crate::imaging::{BackgroundRemover, ImageBackend, Matting, StandardBackend};
use crate::pipeline::plan::{Mode, Scale, Stage, plan};
use crate::pipeline::progress::{ProgressEvent, ProgressSink};
use crate::utils::telemetry::{StageTimer, StageTiming};
use crate::utils::Validator;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub scale: Scale,
    pub mode: Mode,
}

impl RunRequest {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        scale: Scale,
        mode: Mode,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            scale,
            mode,
        }
    }
}

/// Shared flag checked at every stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub mode: Mode,
    pub scale: Scale,
    pub source_dimensions: (u32, u32),
    pub final_dimensions: (u32, u32),
    pub timings: Vec<StageTiming>,
    pub duration: Duration,
}

/// Per-run state; dropped when the run ends either way.
struct RunState {
    artifact: Option<RgbaImage>,
    source_dimensions: (u32, u32),
    final_dimensions: (u32, u32),
}

impl RunState {
    fn new() -> Self {
        Self {
            artifact: None,
            source_dimensions: (0, 0),
            final_dimensions: (0, 0),
        }
    }

    fn take(&mut self) -> std::result::Result<RgbaImage, StageError> {
        self.artifact.take().ok_or(StageError::MissingArtifact)
    }

    fn put(&mut self, image: RgbaImage) {
        self.artifact = Some(image);
    }
}

pub struct Executor<B, M> {
    backend: B,
    remover: M,
    enhance: EnhanceConfig,
    cancel: Option<CancelFlag>,
}

impl Executor<StandardBackend, Matting> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let remover = Matting::from_config(&config.matting)
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        Ok(Self::new(StandardBackend::new(config.output.compression), remover)
            .with_enhance(config.enhance))
    }
}

impl<B: ImageBackend, M: BackgroundRemover> Executor<B, M> {
    pub fn new(backend: B, remover: M) -> Self {
        Self {
            backend,
            remover,
            enhance: EnhanceConfig::default(),
            cancel: None,
        }
    }

    pub fn with_enhance(mut self, enhance: EnhanceConfig) -> Self {
        self.enhance = enhance;
        self
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn remover(&self) -> &M {
        &self.remover
    }

    /// Run every planned stage in order and return the written output path.
    pub fn run(&self, request: &RunRequest, progress: &mut impl ProgressSink) -> Result<PathBuf> {
        self.run_with_summary(request, progress)
            .map(|summary| summary.output)
    }

    pub fn run_with_summary(
        &self,
        request: &RunRequest,
        progress: &mut impl ProgressSink,
    ) -> Result<RunSummary> {
        Validator::validate_input_file(&request.input)?;
        Validator::validate_output_path(&request.output)?;

        let plan = plan(request.mode);
        let stages = plan.stages();
        let total = plan.total();

        info!(
            "Processing {} -> {} ({}, {})",
            request.input.display(),
            request.output.display(),
            request.mode,
            request.scale
        );

        let started = Instant::now();
        let mut state = RunState::new();
        let mut timings = Vec::with_capacity(total);

        for (index, &stage) in stages.iter().enumerate() {
            self.check_cancelled()?;
            progress.on_event(&ProgressEvent::new(index, stages));

            let timer = StageTimer::start(stage);
            if let Err(cause) = self.execute(stage, request, &mut state) {
                error!("{} failed: {}", stage, cause);
                return Err(ProcessingError::Stage { stage, cause });
            }
            timings.push(timer.finish());
        }

        progress.on_event(&ProgressEvent::new(total, stages));

        let duration = started.elapsed();
        info!(
            "Saved {} ({}x{}) in {:.2}s",
            request.output.display(),
            state.final_dimensions.0,
            state.final_dimensions.1,
            duration.as_secs_f64()
        );

        Ok(RunSummary {
            output: request.output.clone(),
            mode: request.mode,
            scale: request.scale,
            source_dimensions: state.source_dimensions,
            final_dimensions: state.final_dimensions,
            timings,
            duration,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => {
                info!("Run cancelled between stages");
                Err(ProcessingError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    fn execute(
        &self,
        stage: Stage,
        request: &RunRequest,
        state: &mut RunState,
    ) -> std::result::Result<(), StageError> {
        match stage {
            Stage::Open => {
                let image = self.backend.open(&request.input)?;
                state.source_dimensions = image.dimensions();
                state.put(image);
            }
            Stage::RemoveBackground => {
                let image = state.take()?;
                state.put(self.remover.remove_background(image)?);
            }
            Stage::Upscale => {
                let image = state.take()?;
                let target = request.scale.apply(image.dimensions()).ok_or_else(|| {
                    StageError::Transform(format!(
                        "{}x{} scaled by {} overflows",
                        image.width(),
                        image.height(),
                        request.scale
                    ))
                })?;
                state.put(self.backend.resize(&image, target)?);
            }
            Stage::Sharpen => {
                let image = state.take()?;
                state.put(self.backend.sharpness(&image, self.enhance.sharpness)?);
            }
            Stage::Contrast => {
                let image = state.take()?;
                state.put(self.backend.contrast(&image, self.enhance.contrast)?);
            }
            Stage::Color => {
                let image = state.take()?;
                state.put(self.backend.color(&image, self.enhance.color)?);
            }
            Stage::Save => {
                let image = state.take()?;
                self.backend.save(&image, &request.output)?;
                state.final_dimensions = image.dimensions();
            }
        }
        Ok(())
    }
}
