use crate::error::IconError;
use image::{ColorType, DynamicImage, ImageFormat};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Pixel layout of a decoded icon, named the way image tools usually print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    L,
    La,
    Rgb,
    Rgba,
    L16,
    La16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
    Unknown,
}

impl ColorMode {
    pub fn is_opaque_rgb(self) -> bool {
        self == ColorMode::Rgb
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            ColorMode::La | ColorMode::Rgba | ColorMode::La16 | ColorMode::Rgba16 | ColorMode::Rgba32F
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorMode::L => "L",
            ColorMode::La => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::L16 => "I;16",
            ColorMode::La16 => "LA;16",
            ColorMode::Rgb16 => "RGB;16",
            ColorMode::Rgba16 => "RGBA;16",
            ColorMode::Rgb32F => "F;RGB",
            ColorMode::Rgba32F => "F;RGBA",
            ColorMode::Unknown => "unknown",
        }
    }
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => ColorMode::L,
            ColorType::La8 => ColorMode::La,
            ColorType::Rgb8 => ColorMode::Rgb,
            ColorType::Rgba8 => ColorMode::Rgba,
            ColorType::L16 => ColorMode::L16,
            ColorType::La16 => ColorMode::La16,
            ColorType::Rgb16 => ColorMode::Rgb16,
            ColorType::Rgba16 => ColorMode::Rgba16,
            ColorType::Rgb32F => ColorMode::Rgb32F,
            ColorType::Rgba32F => ColorMode::Rgba32F,
            _ => ColorMode::Unknown,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

/// A decoded icon together with where it came from.
pub struct IconImage {
    pub path: PathBuf,
    pub image: DynamicImage,
    pub format: ImageFormat,
    pub encoded_bytes: u64,
}

impl IconImage {
    /// Reads and decodes the file, detecting the format from its contents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IconError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| IconError::io(path, e))?;
        let format = image::guess_format(&bytes).map_err(|e| IconError::image(path, e))?;
        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| IconError::image(path, e))?;

        log::debug!(
            "Decoded {} ({}x{}, {:?}, {} bytes)",
            path.display(),
            image.width(),
            image.height(),
            image.color(),
            bytes.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            image,
            format,
            encoded_bytes: bytes.len() as u64,
        })
    }

    pub fn mode(&self) -> ColorMode {
        self.image.color().into()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn report(&self) -> IconReport {
        let (width, height) = self.dimensions();
        IconReport {
            path: self.path.clone(),
            width,
            height,
            mode: self.mode(),
            format: format_name(self.format),
            bytes: self.encoded_bytes,
        }
    }
}

/// What the scripts print about an icon file.
#[derive(Debug, Clone, PartialEq)]
pub struct IconReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    pub format: String,
    pub bytes: u64,
}

impl IconReport {
    /// Re-reads a file from disk and describes it.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, IconError> {
        Ok(IconImage::open(path)?.report())
    }

    /// Size in whole kilobytes, truncated.
    pub fn kilobytes(&self) -> u64 {
        self.bytes / 1024
    }

    pub fn kilobytes_exact(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }

    pub fn size(&self) -> String {
        format!("({}, {})", self.width, self.height)
    }
}

impl fmt::Display for IconReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, mode: {}, format: {}, weight: {:.2} KB",
            self.path.display(),
            self.size(),
            self.mode,
            self.format,
            self.kilobytes_exact()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_color_mode_classification() {
        assert!(ColorMode::Rgb.is_opaque_rgb());
        assert!(!ColorMode::Rgba.is_opaque_rgb());
        assert!(!ColorMode::Rgb16.is_opaque_rgb());
        assert!(ColorMode::Rgba.has_alpha());
        assert!(ColorMode::La.has_alpha());
        assert!(!ColorMode::L.has_alpha());
        assert_eq!(ColorMode::from(ColorType::La8).to_string(), "LA");
        assert_eq!(ColorMode::from(ColorType::Rgba8).to_string(), "RGBA");
    }

    #[test]
    fn test_open_reports_png_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("icon.png");
        RgbaImage::from_pixel(12, 7, Rgba([1, 2, 3, 4])).save(&path).unwrap();

        let report = IconReport::read(&path).unwrap();
        assert_eq!((report.width, report.height), (12, 7));
        assert_eq!(report.mode, ColorMode::Rgba);
        assert_eq!(report.format, "PNG");
        assert_eq!(report.bytes, fs::metadata(&path).unwrap().len());
        assert_eq!(report.size(), "(12, 7)");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = IconImage::open(dir.path().join("nope.png")).err().unwrap();
        assert!(matches!(err, IconError::Io { .. }));
    }

    #[test]
    fn test_kilobytes() {
        let report = IconReport {
            path: PathBuf::from("icon.png"),
            width: 1,
            height: 1,
            mode: ColorMode::Rgb,
            format: "PNG".to_string(),
            bytes: 2560,
        };
        assert_eq!(report.kilobytes(), 2);
        assert_eq!(format!("{:.2}", report.kilobytes_exact()), "2.50");
    }
}
