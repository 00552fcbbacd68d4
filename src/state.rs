use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub const WHITE: [u8; 3] = [255, 255, 255];
pub const BLACK: [u8; 3] = [0, 0, 0];

/// Pan offset applied at load time when auto-centering is on: horizontally
/// centered, nudged up so the face sits in the upper portion of the frame.
pub const AUTO_CENTER_OFFSET: (f32, f32) = (0.0, -10.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
/// Edit parameters for one photo, passed by value into the compositor.
///
/// The decoded images ride along behind `Arc` so history snapshots share the
/// pixel buffers instead of copying them; replacing the `Arc` is the explicit
/// release point when an image is superseded.
pub struct EditState {
    #[serde(skip)]
    pub source_image: Option<Arc<DynamicImage>>,
    #[serde(skip)]
    pub processed_image: Option<Arc<DynamicImage>>,
    pub rotation_degrees: f32,
    pub zoom: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub background_color: [u8; 3],
    pub border_width: u32,
    pub border_color: [u8; 3],
    pub background_removed: bool,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sharpness: f32,
    pub auto_center: bool,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            source_image: None,
            processed_image: None,
            rotation_degrees: 0.0,
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            background_color: WHITE,
            border_width: 2,
            border_color: BLACK,
            background_removed: false,
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            sharpness: 100.0,
            auto_center: true,
        }
    }
}

impl EditState {
    /// The image the compositor should draw: the processed (background
    /// transparent) one when removal succeeded and is enabled, else the
    /// original. Transparency is never synthesized here.
    pub fn active_image(&self) -> Option<&DynamicImage> {
        if self.background_removed {
            if let Some(processed) = self.processed_image.as_deref() {
                return Some(processed);
            }
        }
        self.source_image.as_deref()
    }

    /// Installs a freshly uploaded image and resets everything derived from
    /// the previous one. The old buffers are released here.
    pub fn set_source(&mut self, img: DynamicImage) {
        self.source_image = Some(Arc::new(img));
        self.processed_image = None;
        self.background_removed = false;
        self.rotation_degrees = 0.0;
        self.zoom = 1.0;
        self.brightness = 100.0;
        self.contrast = 100.0;
        self.saturation = 100.0;
        self.sharpness = 100.0;
        let (x, y) = if self.auto_center {
            AUTO_CENTER_OFFSET
        } else {
            (0.0, 0.0)
        };
        self.offset_x = x;
        self.offset_y = y;
    }

    /// Installs a segmentation result. Only called once a processed image
    /// actually exists, so `background_removed` never flips without one.
    pub fn set_processed(&mut self, img: DynamicImage) {
        self.processed_image = Some(Arc::new(img));
        self.background_removed = true;
    }

    /// Copies the edit parameters from another state, keeping this state's
    /// images. Used when parameters saved earlier are re-applied to a fresh
    /// upload.
    pub fn adopt_parameters(&mut self, other: &EditState) {
        self.rotation_degrees = other.rotation_degrees;
        self.zoom = other.zoom;
        self.offset_x = other.offset_x;
        self.offset_y = other.offset_y;
        self.background_color = other.background_color;
        self.border_width = other.border_width;
        self.border_color = other.border_color;
        self.brightness = other.brightness;
        self.contrast = other.contrast;
        self.saturation = other.saturation;
        self.sharpness = other.sharpness;
        self.auto_center = other.auto_center;
    }

    pub fn reset_background_removal(&mut self) {
        self.processed_image = None;
        self.background_removed = false;
    }

    /// Clamps every parameter into its declared domain.
    pub fn clamp_domains(&mut self) {
        self.rotation_degrees = self.rotation_degrees.clamp(-180.0, 180.0);
        self.zoom = self.zoom.clamp(0.5, 3.0);
        self.offset_x = self.offset_x.clamp(-100.0, 100.0);
        self.offset_y = self.offset_y.clamp(-100.0, 100.0);
        self.border_width = self.border_width.min(10);
        self.brightness = self.brightness.clamp(50.0, 150.0);
        self.contrast = self.contrast.clamp(50.0, 150.0);
        self.saturation = self.saturation.clamp(0.0, 200.0);
        self.sharpness = self.sharpness.clamp(50.0, 150.0);
    }

    /// Loads edit parameters from a JSON file, if present and valid.
    pub fn load(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Saves the edit parameters (not the images) as JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Parses a `#RRGGBB` hex color.
pub fn parse_hex_color(s: &str) -> anyhow::Result<[u8; 3]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        anyhow::bail!("expected #RRGGBB, got {s:?}");
    }
    let r = u8::from_str_radix(&hex[0..2], 16)?;
    let g = u8::from_str_radix(&hex[2..4], 16)?;
    let b = u8::from_str_radix(&hex[4..6], 16)?;
    Ok([r, g, b])
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Rgba};

    use super::*;

    fn one_pixel(rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(1, 1, Rgba(rgba)))
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#FFFFFF").unwrap(), [255, 255, 255]);
        assert_eq!(parse_hex_color("#1a2B3c").unwrap(), [26, 43, 60]);
        assert_eq!(parse_hex_color("000000").unwrap(), [0, 0, 0]);
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gggggg").is_err());
    }

    #[test]
    fn active_image_requires_processed_for_removed_background() {
        let mut state = EditState::default();
        state.set_source(one_pixel([10, 20, 30, 255]));
        // Flag set without a processed image: fall back to the source.
        state.background_removed = true;
        let px = state.active_image().unwrap().to_rgba8().get_pixel(0, 0).0;
        assert_eq!(px, [10, 20, 30, 255]);

        state.set_processed(one_pixel([1, 2, 3, 0]));
        let px = state.active_image().unwrap().to_rgba8().get_pixel(0, 0).0;
        assert_eq!(px, [1, 2, 3, 0]);
    }

    #[test]
    fn new_upload_resets_adjustments_and_auto_centers() {
        let mut state = EditState::default();
        state.zoom = 2.0;
        state.brightness = 140.0;
        state.set_processed(one_pixel([0, 0, 0, 0]));

        state.set_source(one_pixel([9, 9, 9, 255]));
        assert!(state.processed_image.is_none());
        assert!(!state.background_removed);
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.brightness, 100.0);
        assert_eq!((state.offset_x, state.offset_y), AUTO_CENTER_OFFSET);
    }

    #[test]
    fn reverting_removal_drops_the_processed_image() {
        let mut state = EditState::default();
        state.set_source(one_pixel([9, 9, 9, 255]));
        state.set_processed(one_pixel([0, 0, 0, 0]));
        assert!(state.background_removed);

        state.reset_background_removal();
        assert!(!state.background_removed);
        assert!(state.processed_image.is_none());
        let px = state.active_image().unwrap().to_rgba8().get_pixel(0, 0).0;
        assert_eq!(px, [9, 9, 9, 255]);
    }

    #[test]
    fn clamp_pulls_values_into_domain() {
        let mut state = EditState::default();
        state.rotation_degrees = 700.0;
        state.zoom = 0.01;
        state.saturation = 300.0;
        state.border_width = 99;
        state.clamp_domains();
        assert_eq!(state.rotation_degrees, 180.0);
        assert_eq!(state.zoom, 0.5);
        assert_eq!(state.saturation, 200.0);
        assert_eq!(state.border_width, 10);
    }

    #[test]
    fn parameters_survive_a_json_round_trip_without_images() {
        let mut state = EditState::default();
        state.set_source(one_pixel([1, 1, 1, 255]));
        state.offset_y = -10.0;
        state.border_width = 4;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edits.json");
        state.save(&path).unwrap();

        let loaded = EditState::load(&path).unwrap();
        assert!(loaded.source_image.is_none());
        assert_eq!(loaded.offset_y, -10.0);
        assert_eq!(loaded.border_width, 4);
    }
}
