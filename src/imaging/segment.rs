// file: src/imaging/segment.rs
// description: model-based background matting around a salient-object segmentation model
// reference: U2Net / ISNet style models taking a 1x3xSxS tensor and returning an SxS mask

use crate::error::StageError;
use crate::imaging::matte::BackgroundRemover;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Input geometry and normalisation a segmentation model was trained with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
    pub side: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl ModelProfile {
    pub const U2NET: ModelProfile = ModelProfile {
        side: 320,
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    pub const ISNET: ModelProfile = ModelProfile {
        side: 1024,
        mean: [0.5, 0.5, 0.5],
        std: [1.0, 1.0, 1.0],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    U2net,
    Isnet,
}

impl ModelKind {
    pub fn profile(&self) -> ModelProfile {
        match self {
            ModelKind::U2net => ModelProfile::U2NET,
            ModelKind::Isnet => ModelProfile::ISNET,
        }
    }
}

/// Runs one forward pass: `input` is a planar `1x3xSxS` tensor, the result
/// is the first `SxS` foreground map, higher meaning more foreground.
pub trait Segmenter {
    fn segment(&self, input: &[f32], side: u32) -> Result<Vec<f32>, StageError>;
}

impl<S: Segmenter + ?Sized> Segmenter for Box<S> {
    fn segment(&self, input: &[f32], side: u32) -> Result<Vec<f32>, StageError> {
        (**self).segment(input, side)
    }
}

/// Background removal driven by a segmentation model's foreground mask.
pub struct ModelMatte<S> {
    segmenter: S,
    profile: ModelProfile,
}

impl<S: Segmenter> ModelMatte<S> {
    pub fn new(segmenter: S, profile: ModelProfile) -> Self {
        Self { segmenter, profile }
    }

    pub fn profile(&self) -> ModelProfile {
        self.profile
    }

    /// Foreground mask at the image's own resolution, 0 = background.
    pub fn mask(&self, image: &RgbaImage) -> Result<GrayImage, StageError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(StageError::Transform("source image is empty".to_string()));
        }

        let side = self.profile.side;
        let tensor = to_tensor(image, &self.profile);
        let raw = self.segmenter.segment(&tensor, side)?;

        let expected = side as usize * side as usize;
        if raw.len() < expected {
            return Err(StageError::Transform(format!(
                "segmentation output has {} values, expected {}",
                raw.len(),
                expected
            )));
        }

        let small = to_mask(&raw[..expected], side);
        Ok(imageops::resize(&small, width, height, FilterType::Lanczos3))
    }
}

impl<S: Segmenter> BackgroundRemover for ModelMatte<S> {
    fn remove_background(&self, mut image: RgbaImage) -> Result<RgbaImage, StageError> {
        let mask = self.mask(&image)?;

        for (pixel, coverage) in image.pixels_mut().zip(mask.pixels()) {
            let Luma([coverage]) = *coverage;
            pixel[3] = ((pixel[3] as u32 * coverage as u32 + 127) / 255) as u8;
        }

        debug!(
            "Applied {}x{} segmentation mask",
            self.profile.side, self.profile.side
        );
        Ok(image)
    }
}

/// Resize to the model side, scale by the brightest channel value, then
/// normalise each channel with the profile's mean and std.
fn to_tensor(image: &RgbaImage, profile: &ModelProfile) -> Vec<f32> {
    let side = profile.side;
    let resized = imageops::resize(image, side, side, FilterType::Lanczos3);

    let max = resized
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2]])
        .max()
        .map(|m| (m as f32).max(1e-6))
        .unwrap_or(1.0);

    let plane = side as usize * side as usize;
    let mut tensor = vec![0.0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            let value = pixel[c] as f32 / max;
            tensor[c * plane + i] = (value - profile.mean[c]) / profile.std[c];
        }
    }
    tensor
}

/// Min-max normalise the raw map into an 8-bit mask.
fn to_mask(raw: &[f32], side: u32) -> GrayImage {
    let (lo, hi) = raw
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = hi - lo;
    let scale = |v: f32| -> f32 {
        if !v.is_finite() {
            0.0
        } else if range > f32::EPSILON {
            (v - lo) / range
        } else {
            v.clamp(0.0, 1.0)
        }
    };

    GrayImage::from_fn(side, side, |x, y| {
        let v = raw[y as usize * side as usize + x as usize];
        Luma([(scale(v) * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::cell::Cell;

    const TEST_PROFILE: ModelProfile = ModelProfile {
        side: 64,
        ..ModelProfile::U2NET
    };

    /// Marks as foreground every position whose red channel is above the mean.
    #[derive(Default)]
    struct RedSegmenter {
        calls: Cell<usize>,
    }

    impl Segmenter for RedSegmenter {
        fn segment(&self, input: &[f32], side: u32) -> Result<Vec<f32>, StageError> {
            self.calls.set(self.calls.get() + 1);
            let plane = side as usize * side as usize;
            assert_eq!(input.len(), 3 * plane);
            Ok(input[..plane]
                .iter()
                .map(|&r| if r > 0.0 { 1.0 } else { 0.0 })
                .collect())
        }
    }

    struct ShortSegmenter;

    impl Segmenter for ShortSegmenter {
        fn segment(&self, _input: &[f32], _side: u32) -> Result<Vec<f32>, StageError> {
            Ok(vec![0.5; 10])
        }
    }

    /// Vertical blue gradient with a red square in the middle.
    fn gradient_with_subject(size: u32, subject: std::ops::Range<u32>) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if subject.contains(&x) && subject.contains(&y) {
                Rgba([220, 30, 30, 255])
            } else {
                let blue = 20 + (210 * y / (size - 1)) as u8;
                Rgba([0, 0, blue, 255])
            }
        })
    }

    #[test]
    fn test_gradient_background_is_removed() {
        let image = gradient_with_subject(40, 14..26);
        let matte = ModelMatte::new(RedSegmenter::default(), TEST_PROFILE);

        let out = matte.remove_background(image).unwrap();

        let far_from_subject = |x: u32, y: u32| !(10..30).contains(&x) || !(10..30).contains(&y);
        let opaque_background = out
            .enumerate_pixels()
            .filter(|(x, y, p)| far_from_subject(*x, *y) && p[3] > 8)
            .count();

        assert_eq!(opaque_background, 0);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(0, 20)[3], 0);
        assert_eq!(out.get_pixel(20, 20)[3], 255);
        assert_eq!(matte.segmenter.calls.get(), 1);
    }

    #[test]
    fn test_mask_matches_image_size() {
        let image = gradient_with_subject(30, 10..20);
        let matte = ModelMatte::new(RedSegmenter::default(), TEST_PROFILE);

        assert_eq!(matte.mask(&image).unwrap().dimensions(), (30, 30));
    }

    #[test]
    fn test_existing_transparency_is_kept() {
        let mut image = gradient_with_subject(20, 6..14);
        image.put_pixel(10, 10, Rgba([220, 30, 30, 0]));
        let matte = ModelMatte::new(RedSegmenter::default(), TEST_PROFILE);

        let out = matte.remove_background(image).unwrap();
        assert_eq!(out.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn test_tensor_is_normalised_per_channel() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let profile = ModelProfile {
            side: 2,
            ..ModelProfile::ISNET
        };

        let tensor = to_tensor(&image, &profile);

        assert_eq!(tensor.len(), 12);
        assert!(tensor[..4].iter().all(|v| (v - 0.5).abs() < 1e-6));
        assert!(tensor[4..].iter().all(|v| (v + 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_flat_output_keeps_raw_values() {
        let mask = to_mask(&[1.0; 4], 2);
        assert!(mask.pixels().all(|p| p.0 == [255]));

        let mask = to_mask(&[0.0, 2.0, 4.0, f32::NAN], 2);
        assert_eq!(mask.get_pixel(0, 0).0, [0]);
        assert_eq!(mask.get_pixel(1, 0).0, [128]);
        assert_eq!(mask.get_pixel(0, 1).0, [255]);
        assert_eq!(mask.get_pixel(1, 1).0, [0]);
    }

    #[test]
    fn test_short_model_output_is_an_error() {
        let matte = ModelMatte::new(ShortSegmenter, TEST_PROFILE);
        let err = matte.remove_background(RgbaImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, StageError::Transform(_)));
    }

    #[test]
    fn test_model_kind_profiles() {
        assert_eq!(ModelKind::default(), ModelKind::U2net);
        assert_eq!(ModelKind::U2net.profile().side, 320);
        assert_eq!(ModelKind::Isnet.profile().side, 1024);
    }
}
