// file: src/imaging/io.rs
// description: image decoding to RGBA and atomic lossless PNG output
// reference: https://docs.rs/image and https://docs.rs/tempfile

use crate::error::StageError;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageError, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// PNG compression effort; `Best` corresponds to "optimize".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

impl From<PngCompression> for CompressionType {
    fn from(value: PngCompression) -> Self {
        match value {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

pub fn open_rgba(path: &Path) -> Result<RgbaImage, StageError> {
    let load_error = |source: ImageError| StageError::Load {
        path: path.to_path_buf(),
        source,
    };

    let image = ImageReader::open(path)
        .map_err(|e| load_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| load_error(ImageError::IoError(e)))?
        .decode()
        .map_err(load_error)?;

    debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );

    Ok(image.into_rgba8())
}

/// Encode `image` as PNG next to `path` and rename it into place.
///
/// The temporary file is removed on any failure, so `path` either holds
/// the complete image or is left untouched.
pub fn save_png(image: &RgbaImage, path: &Path, compression: PngCompression) -> Result<(), StageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StageError::save(path, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoder =
            PngEncoder::new_with_quality(&mut writer, compression.into(), PngFilter::Adaptive);
        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| StageError::save(path, io::Error::other(e)))?;
        writer.flush().map_err(|e| StageError::save(path, e))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| StageError::save(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| StageError::save(path, e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn sample(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 128, if x == 0 { 0 } else { 255 }])
        })
    }

    #[test]
    fn test_save_then_open_is_lossless() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.png");
        let image = sample(8, 6);

        save_png(&image, &path, PngCompression::Best).unwrap();
        let reopened = open_rgba(&path).unwrap();

        assert_eq!(reopened.dimensions(), (8, 6));
        assert_eq!(reopened.as_raw(), image.as_raw());
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.png");

        save_png(&sample(4, 4), &path, PngCompression::Fast).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("out.png");

        let err = save_png(&sample(2, 2), &path, PngCompression::Default).unwrap_err();
        assert!(matches!(err, StageError::Save { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_rename_removes_temporary_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("taken.png");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), b"x").unwrap();

        let err = save_png(&sample(4, 4), &path, PngCompression::Fast).unwrap_err();
        assert!(matches!(err, StageError::Save { .. }));

        let names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["taken.png".to_string()]);
        assert!(path.is_dir());
    }

    #[test]
    fn test_open_rejects_non_image() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = open_rgba(&path).unwrap_err();
        assert!(matches!(err, StageError::Load { .. }));
    }

    #[test]
    fn test_open_sniffs_format_regardless_of_extension() {
        let temp = TempDir::new().unwrap();
        let png_path = temp.path().join("image.png");
        save_png(&sample(3, 3), &png_path, PngCompression::Fast).unwrap();

        let odd_path = temp.path().join("image.bin");
        std::fs::copy(&png_path, &odd_path).unwrap();

        assert_eq!(open_rgba(&odd_path).unwrap().dimensions(), (3, 3));
    }
}
