use crate::codec::{write_png, PngProfile};
use crate::error::IconError;
use crate::icon::{IconImage, IconReport};
use image::DynamicImage;
use std::path::Path;

/// Drops any alpha and widens or narrows channels to 8-bit RGB.
pub fn normalize_to_rgb(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Rewrites the icon in place as maximally compressed opaque RGB.
pub fn compress_icon(path: impl AsRef<Path>) -> Result<IconReport, IconError> {
    let path = path.as_ref();
    let icon = IconImage::open(path)?;
    let original_mode = icon.mode();

    let image = if original_mode.is_opaque_rgb() {
        icon.image
    } else {
        log::info!("Converting {} from {} to RGB", path.display(), original_mode);
        normalize_to_rgb(icon.image)
    };

    let bytes = write_png(path, &image, PngProfile::MaxCompression)?;
    log::info!(
        "Compressed {}: {} -> {} bytes",
        path.display(),
        icon.encoded_bytes,
        bytes
    );

    Ok(IconReport {
        path: path.to_path_buf(),
        width: image.width(),
        height: image.height(),
        mode: image.color().into(),
        format: "PNG".to_string(),
        bytes,
    })
}
