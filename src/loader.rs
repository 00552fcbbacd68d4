use std::path::Path;

use image::DynamicImage;

use crate::error::EngineError;

/// Upload ceiling, checked before any decode work.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

static SUPPORTED_IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif"];

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    exts.iter().any(|known| ext.eq_ignore_ascii_case(known))
}

/// Returns `true` if the path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    has_extension(path, SUPPORTED_IMAGE_EXTS)
}

fn validate_len(len: u64) -> Result<(), EngineError> {
    if len > MAX_FILE_BYTES {
        return Err(EngineError::FileTooLarge {
            actual: len,
            limit: MAX_FILE_BYTES,
        });
    }
    Ok(())
}

/// Opens a portrait photo, rejecting unsupported types and oversized files
/// before they reach the engine.
pub fn open_image(path: &Path) -> Result<DynamicImage, EngineError> {
    if !is_supported_image(path) {
        return Err(EngineError::UnsupportedFile(path.to_path_buf()));
    }
    validate_len(std::fs::metadata(path)?.len())?;
    Ok(image::open(path)?)
}
