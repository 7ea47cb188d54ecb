//! Label rendering for the placeholder icon.
//!
//! An outline font is preferred; when none can be found the label is drawn
//! with a small built-in bitmap font so the placeholder never depends on
//! what happens to be installed.

use crate::config::IconConfig;
use ab_glyph::{point, Font, FontVec, OutlinedGlyph, PxScale, Rect, ScaleFont};
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const MAX_PX: f32 = 300.0;
const MIN_PX: f32 = 8.0;
const SHRINK_STEP: f32 = 0.9;
/// Share of the area the label may cover on each axis.
const FILL_RATIO: f32 = 0.8;
const MAX_SEARCH_DEPTH: usize = 3;

/// Checked in order, matched case-insensitively.
const FONT_FILE_NAMES: &[&str] = &[
    "arial.ttf",
    "arialbd.ttf",
    "arial bold.ttf",
    "dejavusans-bold.ttf",
    "dejavusans.ttf",
    "liberationsans-bold.ttf",
    "liberationsans-regular.ttf",
    "freesansbold.ttf",
    "notosans-bold.ttf",
    "roboto-bold.ttf",
];

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Region of the canvas a label is centered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl LabelArea {
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64
            && y >= self.y as i64
            && x < (self.x + self.width) as i64
            && y < (self.y + self.height) as i64
    }

    fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

pub enum LabelFont {
    Outline { font: FontVec, source: PathBuf },
    Builtin,
}

impl fmt::Display for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelFont::Outline { source, .. } => write!(f, "{}", source.display()),
            LabelFont::Builtin => f.write_str("built-in 5x7 bitmap font"),
        }
    }
}

impl LabelFont {
    /// Picks the configured font, then a known system font, then the built-in one.
    pub fn discover(config: &IconConfig) -> Self {
        if let Some(path) = &config.font_path {
            if let Some(font) = Self::load(path) {
                return font;
            }
            log::warn!("Configured font {} is unusable", path.display());
        }

        let mut roots: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
        roots.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));

        let mut found = HashMap::new();
        for root in &roots {
            collect_font_files(root, 0, &mut found);
        }

        for name in FONT_FILE_NAMES {
            if let Some(path) = found.get(*name) {
                if let Some(font) = Self::load(path) {
                    return font;
                }
            }
        }

        log::info!("No system font found, using the built-in bitmap font");
        LabelFont::Builtin
    }

    pub fn load(path: &Path) -> Option<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("Cannot read font {}: {}", path.display(), e);
                return None;
            }
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                log::info!("Using font {}", path.display());
                Some(LabelFont::Outline {
                    font,
                    source: path.to_path_buf(),
                })
            }
            Err(e) => {
                log::debug!("Cannot parse font {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Draws `text` as large as fits, centered in `area`. Nothing outside
    /// `area` is modified.
    pub fn draw_label(&self, canvas: &mut RgbImage, area: LabelArea, text: &str, color: Rgb<u8>) {
        if text.trim().is_empty() || area.width == 0 || area.height == 0 {
            return;
        }
        match self {
            LabelFont::Outline { font, .. } => draw_outline(font, canvas, area, text, color),
            LabelFont::Builtin => draw_builtin(canvas, area, text, color),
        }
    }
}

fn collect_font_files(dir: &Path, depth: usize, found: &mut HashMap<String, PathBuf>) {
    if depth > MAX_SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, depth + 1, found);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            found.entry(name.to_lowercase()).or_insert(path);
        }
    }
}

fn put(canvas: &mut RgbImage, area: LabelArea, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if !area.contains(x, y) || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0) {
        *dst = (*dst as f32 + (src as f32 - *dst as f32) * coverage).round() as u8;
    }
}

fn layout(font: &FontVec, scale: PxScale, text: &str) -> Vec<OutlinedGlyph> {
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0;
    let mut previous = None;
    let mut glyphs = Vec::new();

    for c in text.chars() {
        let mut glyph = scaled.scaled_glyph(c);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, glyph.id);
        }
        glyph.position = point(caret, scaled.ascent());
        caret += scaled.h_advance(glyph.id);
        previous = Some(glyph.id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            glyphs.push(outlined);
        }
    }
    glyphs
}

fn ink_bounds(glyphs: &[OutlinedGlyph]) -> Option<Rect> {
    glyphs.iter().map(|g| g.px_bounds()).reduce(|a, b| Rect {
        min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
        max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
    })
}

fn draw_outline(font: &FontVec, canvas: &mut RgbImage, area: LabelArea, text: &str, color: Rgb<u8>) {
    let max_width = area.width as f32 * FILL_RATIO;
    let max_height = area.height as f32 * FILL_RATIO;

    let mut px = MAX_PX;
    let (glyphs, bounds) = loop {
        let glyphs = layout(font, PxScale::from(px), text);
        let Some(bounds) = ink_bounds(&glyphs) else {
            return;
        };
        let fits = bounds.width() <= max_width && bounds.height() <= max_height;
        if fits || px * SHRINK_STEP < MIN_PX {
            break (glyphs, bounds);
        }
        px *= SHRINK_STEP;
    };
    log::debug!("Label {:?} drawn at {:.1}px", text, px);

    let (cx, cy) = area.center();
    let offset_x = (cx - bounds.width() / 2.0 - bounds.min.x).round() as i64;
    let offset_y = (cy - bounds.height() / 2.0 - bounds.min.y).round() as i64;

    for glyph in &glyphs {
        let glyph_bounds = glyph.px_bounds();
        let left = glyph_bounds.min.x as i64 + offset_x;
        let top = glyph_bounds.min.y as i64 + offset_y;
        glyph.draw(|x, y, coverage| {
            put(canvas, area, left + x as i64, top + y as i64, color, coverage);
        });
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Rows top to bottom, bit 4 is the leftmost column.
fn builtin_glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0; 7],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

fn draw_builtin(canvas: &mut RgbImage, area: LabelArea, text: &str, color: Rgb<u8>) {
    let count = text.chars().count() as u32;
    let units_wide = count * GLYPH_ADVANCE - 1;
    let max_width = (area.width as f32 * FILL_RATIO) as u32;
    let max_height = (area.height as f32 * FILL_RATIO) as u32;
    let cell = (max_width / units_wide).min(max_height / GLYPH_HEIGHT).max(1);

    let (cx, cy) = area.center();
    let left = (cx - (units_wide * cell) as f32 / 2.0).round() as i64;
    let top = (cy - (GLYPH_HEIGHT * cell) as f32 / 2.0).round() as i64;

    for (index, c) in text.chars().enumerate() {
        let glyph_left = left + (index as u32 * GLYPH_ADVANCE * cell) as i64;
        for (row, bits) in builtin_glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x0 = glyph_left + (col * cell) as i64;
                let y0 = top + (row as u32 * cell) as i64;
                for dy in 0..cell as i64 {
                    for dx in 0..cell as i64 {
                        put(canvas, area, x0 + dx, y0 + dy, color, 1.0);
                    }
                }
            }
        }
    }
}
