// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Terminal error surfaced by the pipeline and its setup.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Invalid mode selection: {0} (expected 1 or 2)")]
    InvalidMode(String),

    #[error("Invalid upscaling factor: {0} (expected 2, 4 or 8)")]
    InvalidScale(u32),

    #[error("Input file '{}' not found", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output path {}: {message}", path.display())]
    Output { path: PathBuf, message: String },

    #[error("{stage} failed: {cause}")]
    Stage { stage: Stage, cause: StageError },

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    /// The stage that failed, if the error came from inside a run.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProcessingError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Failure of a single stage's transformation.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("cannot decode {}: {source}", path.display())]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("{0}")]
    Transform(String),

    #[error("cannot write {}: {source}", path.display())]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no image loaded")]
    MissingArtifact,
}

impl StageError {
    pub fn save(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        StageError::Save {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_message_names_stage() {
        let err = ProcessingError::Stage {
            stage: Stage::Upscale,
            cause: StageError::Transform("target dimensions overflow".to_string()),
        };

        assert_eq!(
            err.to_string(),
            "Upscaling image failed: target dimensions overflow"
        );
        assert_eq!(err.stage(), Some(Stage::Upscale));
    }

    #[test]
    fn test_input_not_found_message() {
        let err = ProcessingError::InputNotFound(PathBuf::from("missing.png"));
        assert_eq!(err.to_string(), "Input file 'missing.png' not found");
        assert_eq!(err.stage(), None);
    }
}
