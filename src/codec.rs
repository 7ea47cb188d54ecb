use crate::error::IconError;
use crate::icon::{format_name, IconImage, IconReport};
use image::codecs::png::{CompressionType, FilterType, PngDecoder, PngEncoder};
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::Path;

const OXIPNG_PRESET: u8 = 4;

/// How hard to work when writing a PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngProfile {
    /// Best zlib effort plus a lossless optimisation pass.
    MaxCompression,
    /// Default zlib effort and nothing else, for picky consumers.
    Compatible,
}

pub fn encode_png(image: &DynamicImage, profile: PngProfile) -> Result<Vec<u8>, image::ImageError> {
    let (compression, filter) = match profile {
        PngProfile::MaxCompression => (CompressionType::Best, FilterType::Adaptive),
        PngProfile::Compatible => (CompressionType::Default, FilterType::Adaptive),
    };

    let mut encoded = Vec::new();
    PngEncoder::new_with_quality(&mut encoded, compression, filter).write_image(
        image.as_bytes(),
        image.width(),
        image.height(),
        image.color(),
    )?;

    if profile == PngProfile::Compatible {
        return Ok(encoded);
    }

    match optimize(&encoded) {
        Ok(optimized) => Ok(optimized),
        Err(e) => {
            log::warn!("{}; keeping encoder output", e);
            Ok(encoded)
        }
    }
}

/// Recompresses an encoded PNG without touching color type, bit depth or palette.
fn optimize(data: &[u8]) -> Result<Vec<u8>, IconError> {
    let mut options = oxipng::Options::from_preset(OXIPNG_PRESET);
    options.bit_depth_reduction = false;
    options.color_type_reduction = false;
    options.palette_reduction = false;
    options.grayscale_reduction = false;

    let optimized = oxipng::optimize_from_memory(data, &options)
        .map_err(|e| IconError::Optimize(e.to_string()))?;
    log::debug!("oxipng: {} -> {} bytes", data.len(), optimized.len());
    Ok(optimized)
}

pub fn write_png(path: &Path, image: &DynamicImage, profile: PngProfile) -> Result<u64, IconError> {
    if !is_png_path(path) {
        log::warn!("Writing PNG data to {} which lacks a .png extension", path.display());
    }

    let encoded = encode_png(image, profile).map_err(|e| IconError::image(path, e))?;
    fs::write(path, &encoded).map_err(|e| IconError::io(path, e))?;
    log::info!("Wrote {} ({} bytes, {:?})", path.display(), encoded.len(), profile);
    Ok(encoded.len() as u64)
}

fn read_png_bytes(path: &Path) -> Result<Vec<u8>, IconError> {
    let bytes = fs::read(path).map_err(|e| IconError::io(path, e))?;
    let format = image::guess_format(&bytes).map_err(|e| IconError::image(path, e))?;
    if format != ImageFormat::Png {
        return Err(IconError::NotPng {
            path: path.to_path_buf(),
            format: format_name(format),
        });
    }
    Ok(bytes)
}

/// Describes a PNG from its IHDR alone, so a damaged body still reports
/// dimensions and mode.
pub fn inspect_header(path: &Path) -> Result<IconReport, IconError> {
    let bytes = read_png_bytes(path)?;
    let decoder = PngDecoder::new(Cursor::new(bytes.as_slice())).map_err(|e| IconError::image(path, e))?;
    let (width, height) = decoder.dimensions();

    Ok(IconReport {
        path: path.to_path_buf(),
        width,
        height,
        mode: decoder.color_type().into(),
        format: format_name(ImageFormat::Png),
        bytes: bytes.len() as u64,
    })
}

/// Checks that the file is a PNG that decodes completely.
pub fn verify_png(path: &Path) -> Result<IconReport, IconError> {
    let bytes = read_png_bytes(path)?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| IconError::image(path, e))?;

    Ok(IconImage {
        path: path.to_path_buf(),
        image,
        format: ImageFormat::Png,
        encoded_bytes: bytes.len() as u64,
    }
    .report())
}

pub fn is_png_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}
