// file: src/imaging/onnx.rs
// description: ONNX Runtime backed segmenter for U2Net / ISNet models
// reference: https://docs.rs/ort

use crate::error::StageError;
use crate::imaging::segment::Segmenter;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

fn onnx_error(e: impl Display) -> StageError {
    StageError::Transform(format!("onnx runtime: {}", e))
}

pub struct OnnxSegmenter {
    session: Mutex<Session>,
    path: PathBuf,
}

impl OnnxSegmenter {
    pub fn load(path: &Path, threads: usize) -> Result<Self, StageError> {
        let session = Session::builder()
            .map_err(onnx_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_error)?
            .with_intra_threads(threads)
            .map_err(onnx_error)?
            .commit_from_file(path)
            .map_err(|e| StageError::Transform(format!("cannot load {}: {}", path.display(), e)))?;

        info!("Loaded segmentation model {}", path.display());
        Ok(Self {
            session: Mutex::new(session),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Segmenter for OnnxSegmenter {
    fn segment(&self, input: &[f32], side: u32) -> Result<Vec<f32>, StageError> {
        let side = side as usize;
        let tensor = Tensor::from_array(([1usize, 3, side, side], input.to_vec())).map_err(onnx_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| StageError::Transform("segmentation session poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![tensor]).map_err(onnx_error)?;

        let (_, values) = outputs[0].try_extract_tensor::<f32>().map_err(onnx_error)?;
        Ok(values.to_vec())
    }
}
