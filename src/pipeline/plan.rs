// file: src/pipeline/plan.rs
// description: processing modes, stage definitions and the stage planner
// reference: fixed stage sequences selected per mode

use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named unit of work in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Open,
    RemoveBackground,
    Upscale,
    Sharpen,
    Contrast,
    Color,
    Save,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Open => "Opening image",
            Stage::RemoveBackground => "Removing background",
            Stage::Upscale => "Upscaling image",
            Stage::Sharpen => "Enhancing sharpness",
            Stage::Contrast => "Enhancing contrast",
            Stage::Color => "Enhancing color",
            Stage::Save => "Saving final image",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const FULL_PIPELINE: [Stage; 7] = [
    Stage::Open,
    Stage::RemoveBackground,
    Stage::Upscale,
    Stage::Sharpen,
    Stage::Contrast,
    Stage::Color,
    Stage::Save,
];

const UPSCALE_ONLY: [Stage; 6] = [
    Stage::Open,
    Stage::Upscale,
    Stage::Sharpen,
    Stage::Contrast,
    Stage::Color,
    Stage::Save,
];

/// Which stage sequence a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    FullPipeline,
    UpscaleOnly,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::FullPipeline, Mode::UpscaleOnly];

    /// Map the numeric menu selector (1 or 2) to a mode.
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(Mode::FullPipeline),
            2 => Ok(Mode::UpscaleOnly),
            other => Err(ProcessingError::InvalidMode(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::FullPipeline => "Remove BG + Upscale",
            Mode::UpscaleOnly => "Upscale Only",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "full" => Ok(Mode::FullPipeline),
            "2" | "upscale" => Ok(Mode::UpscaleOnly),
            _ => Err(ProcessingError::InvalidMode(s.trim().to_string())),
        }
    }
}

/// Supported magnification factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Scale {
    #[default]
    X2,
    X4,
    X8,
}

impl Scale {
    pub const ALL: [Scale; 3] = [Scale::X2, Scale::X4, Scale::X8];

    pub fn factor(&self) -> u32 {
        match self {
            Scale::X2 => 2,
            Scale::X4 => 4,
            Scale::X8 => 8,
        }
    }

    /// Target dimensions for an image of `(width, height)`, or `None` on overflow.
    pub fn apply(&self, (width, height): (u32, u32)) -> Option<(u32, u32)> {
        let factor = self.factor();
        Some((width.checked_mul(factor)?, height.checked_mul(factor)?))
    }
}

impl TryFrom<u32> for Scale {
    type Error = ProcessingError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            2 => Ok(Scale::X2),
            4 => Ok(Scale::X4),
            8 => Ok(Scale::X8),
            other => Err(ProcessingError::InvalidScale(other)),
        }
    }
}

impl From<Scale> for u32 {
    fn from(scale: Scale) -> Self {
        scale.factor()
    }
}

impl FromStr for Scale {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value: u32 = trimmed
            .parse()
            .map_err(|_| ProcessingError::Config(format!("not a number: '{}'", trimmed)))?;
        Scale::try_from(value)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Ordered stage list for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    mode: Mode,
    stages: &'static [Stage],
}

impl Plan {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn stages(&self) -> &'static [Stage] {
        self.stages
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn total(&self) -> usize {
        self.stages.len()
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

pub fn plan(mode: Mode) -> Plan {
    let stages: &'static [Stage] = match mode {
        Mode::FullPipeline => &FULL_PIPELINE,
        Mode::UpscaleOnly => &UPSCALE_ONLY,
    };
    Plan { mode, stages }
}

/// Plan from a raw menu selector; fails with `InvalidMode` outside {1, 2}.
pub fn plan_for_selector(selector: u8) -> Result<Plan> {
    Mode::from_selector(selector).map(plan)
}
