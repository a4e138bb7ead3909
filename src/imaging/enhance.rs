// file: src/imaging/enhance.rs
// description: sharpness, contrast and color enhancement by degenerate-image blending
// reference: interpolate (factor > 1 extrapolates) between a degenerate image and the source

use crate::error::StageError;
use image::{Rgba, RgbaImage};

/// Smoothing kernel used as the sharpness degenerate, normalised by 13.
const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_SCALE: f32 = 13.0;

/// ITU-R 601-2 luma with 16.16 fixed-point weights (0.299, 0.587, 0.114
/// scaled by 65536), rounded by adding half before the shift.
pub fn luma(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn check_factor(factor: f32) -> Result<(), StageError> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(StageError::Transform(format!(
            "enhancement factor must be a finite non-negative number, got {}",
            factor
        )));
    }
    Ok(())
}

fn blend_channel(degenerate: u8, original: u8, factor: f32) -> u8 {
    let base = degenerate as f32;
    (base + factor * (original as f32 - base))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Blend every pixel's colour against its degenerate colour; alpha is kept.
fn blend_with<F>(image: &RgbaImage, factor: f32, degenerate: F) -> RgbaImage
where
    F: Fn(u32, u32, &Rgba<u8>) -> [u8; 3],
{
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let [dr, dg, db] = degenerate(x, y, pixel);
        let [r, g, b, a] = pixel.0;
        Rgba([
            blend_channel(dr, r, factor),
            blend_channel(dg, g, factor),
            blend_channel(db, b, factor),
            a,
        ])
    })
}

/// Factor 0 gives the smoothed image, 1 the original, above 1 sharpens.
/// The outermost ring of pixels has no full neighbourhood and is left as is.
pub fn sharpness(image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError> {
    check_factor(factor)?;
    let (width, height) = image.dimensions();

    Ok(blend_with(image, factor, |x, y, pixel| {
        if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
            return [pixel[0], pixel[1], pixel[2]];
        }

        let mut acc = [0u32; 3];
        for (dy, row) in SMOOTH_KERNEL.iter().enumerate() {
            for (dx, weight) in row.iter().enumerate() {
                let neighbour = image.get_pixel(x + dx as u32 - 1, y + dy as u32 - 1);
                for (sum, channel) in acc.iter_mut().zip(neighbour.0) {
                    *sum += channel as u32 * weight;
                }
            }
        }

        acc.map(|sum| (sum as f32 / SMOOTH_SCALE).round().min(255.0) as u8)
    }))
}

/// Factor 0 gives flat grey at the mean luma, 1 the original.
pub fn contrast(image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError> {
    check_factor(factor)?;

    let pixel_count = image.width() as u64 * image.height() as u64;
    if pixel_count == 0 {
        return Ok(image.clone());
    }
    let total: u64 = image.pixels().map(|p| luma(p) as u64).sum();
    let mean = ((total as f64 / pixel_count as f64) + 0.5) as u8;

    Ok(blend_with(image, factor, |_, _, _| [mean, mean, mean]))
}

/// Factor 0 gives greyscale, 1 the original, above 1 saturates.
pub fn color(image: &RgbaImage, factor: f32) -> Result<RgbaImage, StageError> {
    check_factor(factor)?;

    Ok(blend_with(image, factor, |_, _, pixel| {
        let grey = luma(pixel);
        [grey, grey, grey]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) * 7 % 256) as u8,
                (128 + x % 128) as u8,
            ])
        })
    }

    #[test]
    fn test_luma_matches_weights() {
        assert_eq!(luma(&Rgba([255, 255, 255, 0])), 255);
        assert_eq!(luma(&Rgba([0, 0, 0, 255])), 0);
        assert_eq!(luma(&Rgba([255, 0, 0, 255])), 76);
        assert_eq!(luma(&Rgba([0, 255, 0, 255])), 150);
        assert_eq!(luma(&Rgba([0, 0, 255, 255])), 29);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let image = gradient(9, 7);
        assert_eq!(sharpness(&image, 1.0).unwrap(), image);
        assert_eq!(contrast(&image, 1.0).unwrap(), image);
        assert_eq!(color(&image, 1.0).unwrap(), image);
    }

    #[test]
    fn test_alpha_is_preserved() {
        let image = gradient(6, 6);
        for enhanced in [
            sharpness(&image, 1.6).unwrap(),
            contrast(&image, 1.2).unwrap(),
            color(&image, 1.1).unwrap(),
        ] {
            let alphas: Vec<u8> = enhanced.pixels().map(|p| p[3]).collect();
            let expected: Vec<u8> = image.pixels().map(|p| p[3]).collect();
            assert_eq!(alphas, expected);
        }
    }

    #[test]
    fn test_color_zero_is_greyscale() {
        let image = gradient(4, 4);
        let grey = color(&image, 0.0).unwrap();
        for (out, src) in grey.pixels().zip(image.pixels()) {
            let l = luma(src);
            assert_eq!([out[0], out[1], out[2]], [l, l, l]);
        }
    }

    #[test]
    fn test_contrast_spreads_values_around_mean() {
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([100, 100, 100, 255])
            } else {
                Rgba([200, 200, 200, 255])
            }
        });
        let out = contrast(&image, 1.2).unwrap();

        // mean luma is 150: 150 + 1.2 * (100 - 150) = 90, 150 + 1.2 * 50 = 210
        assert_eq!(out.get_pixel(0, 0).0, [90, 90, 90, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [210, 210, 210, 255]);
    }

    #[test]
    fn test_sharpness_accentuates_centre_spike() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([100, 100, 100, 255]));
        image.put_pixel(1, 1, Rgba([200, 200, 200, 255]));

        let out = sharpness(&image, 2.0).unwrap();

        // smoothed centre = (8 * 100 + 5 * 200) / 13 = 138.46 -> 138
        // 138 + 2 * (200 - 138) = 262 -> clamped
        assert_eq!(out.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100, 255]);
    }

    #[test]
    fn test_uniform_image_is_unchanged_by_every_enhancement() {
        let image = RgbaImage::from_pixel(5, 5, Rgba([120, 120, 120, 200]));
        assert_eq!(sharpness(&image, 1.6).unwrap(), image);
        assert_eq!(contrast(&image, 1.2).unwrap(), image);
        assert_eq!(color(&image, 1.1).unwrap(), image);
    }

    #[test]
    fn test_invalid_factor_is_rejected() {
        let image = gradient(2, 2);
        assert!(sharpness(&image, f32::NAN).is_err());
        assert!(contrast(&image, -1.0).is_err());
        assert!(color(&image, f32::INFINITY).is_err());
    }
}
