use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

pub const DEFAULT_JPG_QUALITY: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Jpg,
    Png,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "JPG",
            ExportFormat::Png => "PNG",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
        }
    }
}

/// `PassportPhotos_<rows>Rows_<count>Photos_<timestamp>.<ext>`
pub fn default_filename(rows: u32, columns: u32, format: ExportFormat) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S");
    format!(
        "PassportPhotos_{rows}Rows_{photos}Photos_{timestamp}.{ext}",
        photos = rows * columns,
        ext = format.extension()
    )
}

/// Writes the finished page buffer to disk. The buffer already has the exact
/// page pixel geometry, so no scaling happens here.
pub fn save_page(
    page: &RgbaImage,
    path: &Path,
    format: ExportFormat,
    jpg_quality: u8,
) -> anyhow::Result<()> {
    match format {
        ExportFormat::Jpg => {
            let writer = BufWriter::new(File::create(path)?);
            let encoder = JpegEncoder::new_with_quality(writer, jpg_quality);
            // JPEG has no alpha; the page is opaque by construction.
            DynamicImage::ImageRgba8(page.clone())
                .to_rgb8()
                .write_with_encoder(encoder)?;
        }
        ExportFormat::Png => page.save(path)?,
    }
    Ok(())
}
