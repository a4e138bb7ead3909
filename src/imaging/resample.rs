// file: src/imaging/resample.rs
// description: Lanczos resampling on premultiplied alpha
// reference: https://docs.rs/image/latest/image/imageops/fn.resize.html

use crate::error::StageError;
use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};

/// Resize with a Lanczos3 kernel, weighting colour by coverage.
///
/// Colour channels are premultiplied before filtering and divided back out
/// afterwards, so transparent pixels contribute nothing to their
/// neighbours' colour at soft edges.
pub fn resize_premultiplied(
    image: &RgbaImage,
    (width, height): (u32, u32),
) -> Result<RgbaImage, StageError> {
    if width == 0 || height == 0 {
        return Err(StageError::Transform(format!(
            "target dimensions {}x{} must be non-zero",
            width, height
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(StageError::Transform("source image is empty".to_string()));
    }

    let premultiplied = premultiply(image);
    let resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);
    Ok(unpremultiply(&resized))
}

fn premultiply(image: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = a as f32 / 255.0;
        Rgba([
            r as f32 / 255.0 * alpha,
            g as f32 / 255.0 * alpha,
            b as f32 / 255.0 * alpha,
            alpha,
        ])
    })
}

fn unpremultiply(image: &Rgba32FImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = a.clamp(0.0, 1.0);
        let alpha_byte = to_byte(alpha);
        if alpha_byte == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([
            to_byte(r / alpha),
            to_byte(g / alpha),
            to_byte(b / alpha),
            alpha_byte,
        ])
    })
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
