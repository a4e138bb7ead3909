// file: src/imaging/mod.rs
// description: image collaborator interface and its image-crate implementation
// reference: internal module structure

pub mod enhance;
pub mod io;
pub mod matte;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod resample;
pub mod segment;

pub use io::PngCompression;
pub use matte::{BackgroundRemover, BorderMatte, Matting};
#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmenter;
pub use segment::{ModelKind, ModelMatte, ModelProfile, Segmenter};

use crate::error::StageError;
use image::RgbaImage;
use std::path::Path;

/// The image operations a run is built from.
pub trait ImageBackend {
    fn open(&self, path: &Path) -> Result<RgbaImage, StageError>;

    fn resize(&self, image: &RgbaImage, dimensions: (u32, u32)) -> Result<RgbaImage, StageError>;

    fn sharpness(&self, image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError>;

    fn contrast(&self, image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError>;

    fn color(&self, image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError>;

    /// Write `image` losslessly; must not leave a partial file behind on failure.
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), StageError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBackend {
    compression: PngCompression,
}

impl StandardBackend {
    pub fn new(compression: PngCompression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> PngCompression {
        self.compression
    }
}

impl ImageBackend for StandardBackend {
    fn open(&self, path: &Path) -> Result<RgbaImage, StageError> {
        io::open_rgba(path)
    }

    fn resize(&self, image: &RgbaImage, dimensions: (u32, u32)) -> Result<RgbaImage, StageError> {
        resample::resize_premultiplied(image, dimensions)
    }

    fn sharpness(&self, image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError> {
        enhance::sharpness(image, factor)
    }

    fn contrast(&self, image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError> {
        enhance::contrast(image, factor)
    }

    fn color(&self, image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError> {
        enhance::color(image, factor)
    }

    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), StageError> {
        io::save_png(image, path, self.compression)
    }
}
