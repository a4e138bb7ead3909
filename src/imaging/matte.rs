// file: src/imaging/matte.rs
// description: background matting seam and the built-in border-connected colour key
// reference: flood fill from the image border over background-coloured pixels

use crate::config::MattingConfig;
use crate::error::StageError;
#[cfg(feature = "onnx")]
use crate::imaging::onnx::OnnxSegmenter;
#[cfg(feature = "onnx")]
use crate::imaging::segment::ModelMatte;
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

/// Turns an RGBA image into one whose background pixels are transparent.
pub trait BackgroundRemover {
    fn remove_background(&self, image: RgbaImage) -> Result<RgbaImage, StageError>;
}

impl<R: BackgroundRemover + ?Sized> BackgroundRemover for &R {
    fn remove_background(&self, image: RgbaImage) -> Result<RgbaImage, StageError> {
        (**self).remove_background(image)
    }
}

impl<R: BackgroundRemover + ?Sized> BackgroundRemover for Box<R> {
    fn remove_background(&self, image: RgbaImage) -> Result<RgbaImage, StageError> {
        (**self).remove_background(image)
    }
}

/// The remover a configured run uses: a segmentation model when one is
/// set, the border colour key otherwise.
pub enum Matting {
    ColourKey(BorderMatte),
    #[cfg(feature = "onnx")]
    Model(ModelMatte<OnnxSegmenter>),
}

impl Matting {
    pub fn from_config(config: &MattingConfig) -> Result<Self, StageError> {
        match &config.model {
            Some(path) => Self::from_model(path, config),
            None => {
                let matte = BorderMatte::new(config.tolerance, config.feather)?;
                info!(
                    "Background matting: colour key (tolerance {}, feather {})",
                    matte.tolerance(),
                    matte.feather()
                );
                Ok(Matting::ColourKey(matte))
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn from_model(path: &Path, config: &MattingConfig) -> Result<Self, StageError> {
        let segmenter = OnnxSegmenter::load(path, config.threads)?;
        info!(
            "Background matting: {:?} model {}",
            config.kind,
            segmenter.path().display()
        );
        Ok(Matting::Model(ModelMatte::new(
            segmenter,
            config.kind.profile(),
        )))
    }

    #[cfg(not(feature = "onnx"))]
    fn from_model(path: &Path, _config: &MattingConfig) -> Result<Self, StageError> {
        Err(StageError::Transform(format!(
            "matting model {} needs a build with the `onnx` feature",
            path.display()
        )))
    }
}

impl BackgroundRemover for Matting {
    fn remove_background(&self, image: RgbaImage) -> Result<RgbaImage, StageError> {
        match self {
            Matting::ColourKey(matte) => matte.remove_background(image),
            #[cfg(feature = "onnx")]
            Matting::Model(matte) => matte.remove_background(image),
        }
    }
}

/// Keys out the region connected to the image border whose colour is close
/// to the border's median colour.
///
/// Pixels within `tolerance` (Euclidean RGB distance) of the background
/// colour become fully transparent. Pixels adjacent to that region and
/// within a further `feather` band keep a proportional share of their
/// alpha, which softens the cut-out edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderMatte {
    tolerance: f32,
    feather: f32,
}

impl Default for BorderMatte {
    fn default() -> Self {
        Self {
            tolerance: 48.0,
            feather: 24.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Cell {
    Unvisited,
    Background,
    Edge,
}

impl BorderMatte {
    pub fn new(tolerance: f32, feather: f32) -> Result<Self, StageError> {
        for (name, value) in [("tolerance", tolerance), ("feather", feather)] {
            if !value.is_finite() || value < 0.0 {
                return Err(StageError::Transform(format!(
                    "matting {} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(Self { tolerance, feather })
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn feather(&self) -> f32 {
        self.feather
    }

    /// Median colour of the opaque border pixels, if there are any.
    pub fn estimate_background(image: &RgbaImage) -> Option<[u8; 3]> {
        let mut channels: [Vec<u8>; 3] = Default::default();
        for (x, y) in border_coords(image.width(), image.height()) {
            let pixel = image.get_pixel(x, y);
            if pixel[3] == 0 {
                continue;
            }
            for (values, value) in channels.iter_mut().zip(pixel.0) {
                values.push(value);
            }
        }

        if channels[0].is_empty() {
            return None;
        }

        Some(channels.map(|mut values| {
            values.sort_unstable();
            values[values.len() / 2]
        }))
    }

    fn distance(pixel: &Rgba<u8>, background: [u8; 3]) -> f32 {
        if pixel[3] == 0 {
            return 0.0;
        }
        pixel
            .0
            .iter()
            .zip(background)
            .map(|(&c, b)| {
                let d = c as f32 - b as f32;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }

    fn classify(&self, distance: f32) -> Cell {
        if distance <= self.tolerance {
            Cell::Background
        } else if distance <= self.tolerance + self.feather {
            Cell::Edge
        } else {
            Cell::Unvisited
        }
    }
}

impl BackgroundRemover for BorderMatte {
    fn remove_background(&self, mut image: RgbaImage) -> Result<RgbaImage, StageError> {
        let (width, height) = image.dimensions();
        let Some(background) = Self::estimate_background(&image) else {
            debug!("Border is already transparent, nothing to key out");
            return Ok(image);
        };
        debug!("Estimated background colour: {:?}", background);

        let index = |x: u32, y: u32| y as usize * width as usize + x as usize;
        let mut cells = vec![Cell::Unvisited; width as usize * height as usize];
        let mut queue = VecDeque::new();

        let visit = |x: u32, y: u32, cells: &mut Vec<Cell>, queue: &mut VecDeque<(u32, u32)>| {
            let i = index(x, y);
            if cells[i] != Cell::Unvisited {
                return;
            }
            let cell = self.classify(Self::distance(image.get_pixel(x, y), background));
            cells[i] = cell;
            if cell == Cell::Background {
                queue.push_back((x, y));
            }
        };

        for (x, y) in border_coords(width, height) {
            visit(x, y, &mut cells, &mut queue);
        }

        while let Some((x, y)) = queue.pop_front() {
            if x > 0 {
                visit(x - 1, y, &mut cells, &mut queue);
            }
            if x + 1 < width {
                visit(x + 1, y, &mut cells, &mut queue);
            }
            if y > 0 {
                visit(x, y - 1, &mut cells, &mut queue);
            }
            if y + 1 < height {
                visit(x, y + 1, &mut cells, &mut queue);
            }
        }

        let mut cleared = 0usize;
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            match cells[index(x, y)] {
                Cell::Background => {
                    pixel[3] = 0;
                    cleared += 1;
                }
                Cell::Edge if self.feather > 0.0 => {
                    let over = Self::distance(pixel, background) - self.tolerance;
                    let keep = (over / self.feather).clamp(0.0, 1.0);
                    pixel[3] = (pixel[3] as f32 * keep).round() as u8;
                }
                _ => {}
            }
        }

        debug!(
            "Keyed out {} of {} pixels",
            cleared,
            width as usize * height as usize
        );
        Ok(image)
    }
}

fn border_coords(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let top_bottom = (0..width).flat_map(move |x| {
        let bottom = (height > 1).then_some((x, height.saturating_sub(1)));
        std::iter::once((x, 0)).chain(bottom)
    });
    let sides = (1..height.saturating_sub(1)).flat_map(move |y| {
        let right = (width > 1).then_some((width.saturating_sub(1), y));
        std::iter::once((0, y)).chain(right)
    });
    top_bottom.chain(sides).filter(move |_| width > 0 && height > 0)
}
