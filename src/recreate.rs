use crate::codec::{inspect_header, verify_png, write_png, PngProfile};
use crate::compress::normalize_to_rgb;
use crate::config::IconPaths;
use crate::error::IconError;
use crate::flatten::WHITE;
use crate::font::{LabelArea, LabelFont};
use crate::icon::{IconImage, IconReport};
use image::{imageops, DynamicImage, Rgb, RgbImage};
use std::fmt;
use std::path::Path;

pub const CANVAS_SIZE: u32 = 1024;
pub const BRAND_COLOR: Rgb<u8> = Rgb([0x3b, 0x82, 0xf6]);
/// The brand block spans 100..=924 on both axes.
pub const BRAND_BLOCK: LabelArea = LabelArea {
    x: 100,
    y: 100,
    width: 825,
    height: 825,
};

pub const RECOMMENDATIONS: &[&str] = &[
    "1. Try icon_new.png (simple test icon)",
    "2. Or use icon_repaired.png (your repaired icon)",
    "3. If neither works, the problem is in the Expo app configuration",
];

/// Builds the 1024x1024 placeholder: white canvas, brand block, centered label.
pub fn synthesize_placeholder(label: &str, font: &LabelFont) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, WHITE);
    let block = BRAND_BLOCK;
    let fill = RgbImage::from_pixel(block.width, block.height, BRAND_COLOR);
    imageops::replace(&mut canvas, &fill, block.x as i64, block.y as i64);
    font.draw_label(&mut canvas, block, label, WHITE);
    canvas
}

/// Re-encodes `source` as plain RGB into `target`, whatever its mode was.
pub fn repair_icon(source: &Path, target: &Path) -> Result<IconReport, IconError> {
    let icon = IconImage::open(source)?;
    let rgb = normalize_to_rgb(icon.image);
    write_png(target, &rgb, PngProfile::Compatible)?;
    IconReport::read(target)
}

fn create_placeholder(target: &Path, label: &str, font: &LabelFont) -> Result<IconReport, IconError> {
    let placeholder = DynamicImage::ImageRgb8(synthesize_placeholder(label, font));
    write_png(target, &placeholder, PngProfile::Compatible)?;
    IconReport::read(target)
}

/// Outcome of every step; a failed step never stops the later ones.
pub struct Diagnosis {
    pub header: Result<IconReport, IconError>,
    pub verification: Result<IconReport, IconError>,
    pub working_copy: Result<IconReport, IconError>,
    pub new_icon: Result<IconReport, IconError>,
    pub repaired: Result<IconReport, IconError>,
    pub font: String,
}

impl Diagnosis {
    pub fn run(paths: &IconPaths, label: &str, font: &LabelFont) -> Self {
        Self::run_with_progress(paths, label, font, |_| {})
    }

    /// Runs every step, handing each section of the report to `progress`
    /// as soon as the step behind it finishes.
    pub fn run_with_progress(
        paths: &IconPaths,
        label: &str,
        font: &LabelFont,
        mut progress: impl FnMut(&str),
    ) -> Self {
        progress(TITLE);

        let header = inspect_header(&paths.icon);
        let verification = verify_png(&paths.icon);
        if let Err(e) = &verification {
            log::warn!("Verification of {} failed: {}", paths.icon.display(), e);
        }
        let working_copy = IconReport::read(&paths.icon);
        progress(&current_icon_section(&header, &verification, &working_copy));

        progress(NEW_ICON_HEADING);
        let font_name = font.to_string();
        let new_icon = create_placeholder(&paths.new_icon, label, font);
        progress(&new_icon_section(&new_icon, &font_name));

        progress(REPAIR_HEADING);
        let repaired = repair_icon(&paths.icon, &paths.repaired_icon);
        progress(&repaired_section(&repaired));

        progress(&recommendations_section());

        Self {
            header,
            verification,
            working_copy,
            new_icon,
            repaired,
            font: font_name,
        }
    }
}

const TITLE: &str = "=== FULL DIAGNOSTIC ===\n";
const NEW_ICON_HEADING: &str = "\n2. Creating a new icon from scratch...";
const REPAIR_HEADING: &str = "\n4. Trying to repair the current icon...";

fn file_name(report: &IconReport) -> String {
    report
        .path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn current_icon_section(
    header: &Result<IconReport, IconError>,
    verification: &Result<IconReport, IconError>,
    working_copy: &Result<IconReport, IconError>,
) -> String {
    let mut lines = Vec::new();
    match header {
        Ok(report) => {
            lines.push("1. Current icon found:".to_string());
            lines.push(format!("   - Size: {}", report.size()));
            lines.push(format!("   - Mode: {}", report.mode));
            lines.push(format!("   - Format: {}", report.format));
        }
        Err(_) => lines.push("1. Current icon check:".to_string()),
    }
    match verification {
        Ok(_) => lines.push("   - Verification: OK ✓".to_string()),
        Err(e) => lines.push(format!("   ERROR: {}", e)),
    }
    match working_copy {
        Ok(report) => lines.push(format!("   - Reopened: {}, mode: {}", report.size(), report.mode)),
        Err(e) => lines.push(format!("   - Reopen failed: {}", e)),
    }
    lines.join("\n")
}

fn new_icon_section(new_icon: &Result<IconReport, IconError>, font: &str) -> String {
    match new_icon {
        Ok(report) => [
            format!("   - New icon created: {} (font: {})", file_name(report), font),
            "\n3. New icon check:".to_string(),
            format!("   - Size: {}", report.size()),
            format!("   - Mode: {}", report.mode),
            format!("   - Format: {}", report.format),
            format!("   - Weight: {:.2} KB", report.kilobytes_exact()),
        ]
        .join("\n"),
        Err(e) => format!("   - Failed to create new icon: {}", e),
    }
}

fn repaired_section(repaired: &Result<IconReport, IconError>) -> String {
    match repaired {
        Ok(report) => format!("   - Repaired icon: {}", file_name(report)),
        Err(e) => format!("   - Repair failed: {}", e),
    }
}

fn recommendations_section() -> String {
    let mut lines = vec!["\n=== RECOMMENDATIONS ===".to_string()];
    lines.extend(RECOMMENDATIONS.iter().map(|line| line.to_string()));
    lines.join("\n")
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(
            f,
            "{}",
            current_icon_section(&self.header, &self.verification, &self.working_copy)
        )?;
        writeln!(f, "{}", NEW_ICON_HEADING)?;
        writeln!(f, "{}", new_icon_section(&self.new_icon, &self.font))?;
        writeln!(f, "{}", REPAIR_HEADING)?;
        writeln!(f, "{}", repaired_section(&self.repaired))?;
        writeln!(f, "{}", recommendations_section())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::ColorMode;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_placeholder_layout() {
        let icon = synthesize_placeholder("ATT", &LabelFont::Builtin);
        assert_eq!(icon.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        assert_eq!(icon.get_pixel(50, 50), &WHITE);
        assert_eq!(icon.get_pixel(99, 500), &WHITE);
        assert_eq!(icon.get_pixel(925, 925), &WHITE);
        assert_eq!(icon.get_pixel(100, 100), &BRAND_COLOR);
        assert_eq!(icon.get_pixel(924, 924), &BRAND_COLOR);
        assert_eq!(icon.get_pixel(120, 500), &BRAND_COLOR);

        let label_pixels = (100..925u32)
            .flat_map(|y| (100..925u32).map(move |x| (x, y)))
            .filter(|&(x, y)| icon.get_pixel(x, y) == &WHITE)
            .count();
        assert!(label_pixels > 0);
    }

    #[test]
    fn test_missing_source_still_produces_placeholder() {
        let dir = TempDir::new().unwrap();
        let paths = IconPaths::in_dir(dir.path());

        let diagnosis = Diagnosis::run(&paths, "ATT", &LabelFont::Builtin);
        assert!(matches!(diagnosis.verification, Err(IconError::Io { .. })));
        assert!(diagnosis.working_copy.is_err());
        assert!(diagnosis.repaired.is_err());
        assert!(!paths.repaired_icon.exists());

        let new_icon = diagnosis.new_icon.as_ref().unwrap();
        assert_eq!((new_icon.width, new_icon.height), (1024, 1024));
        assert_eq!(new_icon.mode, ColorMode::Rgb);
        assert_eq!(image::open(&paths.new_icon).unwrap().color(), image::ColorType::Rgb8);

        let printed = diagnosis.to_string();
        assert!(printed.contains("ERROR:"));
        assert!(printed.contains("Repair failed"));
        assert!(printed.contains(RECOMMENDATIONS[2]));
    }

    #[test]
    fn test_corrupt_source_is_reported() {
        let dir = TempDir::new().unwrap();
        let paths = IconPaths::in_dir(dir.path());
        fs::write(&paths.icon, b"\x89PNG\r\n\x1a\ngarbage").unwrap();

        let diagnosis = Diagnosis::run(&paths, "ATT", &LabelFont::Builtin);
        assert!(diagnosis.verification.is_err());
        assert!(diagnosis.repaired.is_err());
        assert!(diagnosis.new_icon.is_ok());
    }

    #[test]
    fn test_damaged_body_still_reports_header() {
        let dir = TempDir::new().unwrap();
        let paths = IconPaths::in_dir(dir.path());
        let source = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, (x ^ y) as u8]));
        source.save(&paths.icon).unwrap();
        let encoded = fs::read(&paths.icon).unwrap();
        fs::write(&paths.icon, &encoded[..encoded.len() - 40]).unwrap();

        let diagnosis = Diagnosis::run(&paths, "ATT", &LabelFont::Builtin);
        let header = diagnosis.header.as_ref().unwrap();
        assert_eq!((header.width, header.height), (64, 48));
        assert_eq!(header.mode, ColorMode::Rgb);
        assert_eq!(header.format, "PNG");
        assert!(diagnosis.verification.is_err());

        let printed = diagnosis.to_string();
        assert!(printed.contains("   - Size: (64, 48)"));
        assert!(printed.contains("   - Mode: RGB"));
        assert!(printed.contains("   - Format: PNG"));
        assert!(printed.contains("ERROR:"));
        assert!(!printed.contains("Verification: OK"));
    }

    #[test]
    fn test_progress_arrives_in_step_order() {
        let dir = TempDir::new().unwrap();
        let paths = IconPaths::in_dir(dir.path());

        let mut sections = Vec::new();
        let diagnosis = Diagnosis::run_with_progress(&paths, "ATT", &LabelFont::Builtin, |section| {
            sections.push(section.to_string());
        });

        assert_eq!(sections.len(), 7);
        assert!(sections[0].contains("FULL DIAGNOSTIC"));
        assert!(sections[1].contains("ERROR:"));
        assert!(sections[2].contains("2. Creating a new icon"));
        assert!(sections[3].contains("New icon created"));
        assert!(sections[4].contains("4. Trying to repair"));
        assert!(sections[5].contains("Repair failed"));
        assert!(sections[6].contains(RECOMMENDATIONS[0]));

        let joined: String = sections.iter().map(|s| format!("{}\n", s)).collect();
        assert_eq!(joined, diagnosis.to_string());
    }

    #[test]
    fn test_valid_source_is_repaired_to_rgb() {
        let dir = TempDir::new().unwrap();
        let paths = IconPaths::in_dir(dir.path());
        let source = RgbaImage::from_fn(32, 32, |x, y| Rgba([x as u8 * 8, y as u8 * 8, 0, 100]));
        source.save(&paths.icon).unwrap();

        let diagnosis = Diagnosis::run(&paths, "ATT", &LabelFont::Builtin);
        let verified = diagnosis.verification.as_ref().unwrap();
        assert_eq!(verified.mode, ColorMode::Rgba);
        assert_eq!(verified.format, "PNG");

        let repaired = diagnosis.repaired.as_ref().unwrap();
        assert_eq!(repaired.mode, ColorMode::Rgb);
        let written = image::open(&paths.repaired_icon).unwrap().to_rgb8();
        assert_eq!(written, DynamicImage::ImageRgba8(source).to_rgb8());

        // The original is left alone.
        assert_eq!(image::open(&paths.icon).unwrap().color(), image::ColorType::Rgba8);
        assert!(diagnosis.to_string().contains("Verification: OK"));
    }
}
