use crate::codec::{write_png, PngProfile};
use crate::error::IconError;
use crate::icon::{ColorMode, IconImage, IconReport};
use image::{imageops, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const OPAQUE_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Composites the image onto opaque white, using alpha as the blend weight.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let mode = ColorMode::from(image.color());
    if !mode.has_alpha() {
        return image.to_rgb8();
    }

    let source = image.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(source.width(), source.height(), OPAQUE_WHITE);
    imageops::overlay(&mut canvas, &source, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// The icon as it was read and as it was written back.
#[derive(Debug, Clone)]
pub struct Flattened {
    pub original: IconReport,
    pub result: IconReport,
}

/// Replaces the icon's transparency with a white background, in place.
pub fn flatten_icon(path: impl AsRef<Path>) -> Result<Flattened, IconError> {
    let path = path.as_ref();
    let icon = IconImage::open(path)?;
    let original = icon.report();

    let flattened = DynamicImage::ImageRgb8(flatten_onto_white(&icon.image));
    write_png(path, &flattened, PngProfile::MaxCompression)?;

    Ok(Flattened {
        original,
        result: IconReport::read(path)?,
    })
}
