use image::RgbaImage;

use crate::state::EditState;

/// Sharpness has no single-pass pixel equivalent here, so it is approximated
/// by an extra contrast nudge at half strength.
fn sharpness_as_contrast(sharpness: f32) -> f32 {
    100.0 + (sharpness - 100.0) * 0.5
}

fn is_identity(value: f32) -> bool {
    (value - 100.0).abs() < 0.001
}

/// Applies the percentage color filters (100 = identity for each) in the
/// order brightness, contrast, saturation, sharpness proxy. Alpha is
/// preserved so a transparent subject stays transparent.
pub fn apply(img: RgbaImage, state: &EditState) -> RgbaImage {
    let sharp = sharpness_as_contrast(state.sharpness);
    if is_identity(state.brightness)
        && is_identity(state.contrast)
        && is_identity(state.saturation)
        && is_identity(sharp)
    {
        return img;
    }

    let brightness = state.brightness / 100.0;
    let contrast = state.contrast / 100.0;
    let saturation = state.saturation / 100.0;
    let sharp = sharp / 100.0;

    let mut out = img;
    for px in out.pixels_mut() {
        let mut rgb = [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        ];

        for v in rgb.iter_mut() {
            *v = (*v * brightness).clamp(0.0, 1.0);
            *v = ((*v - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        }

        // Saturation: lerp between the luma gray and the color.
        let luma = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
        for v in rgb.iter_mut() {
            *v = (luma + (*v - luma) * saturation).clamp(0.0, 1.0);
            *v = ((*v - 0.5) * sharp + 0.5).clamp(0.0, 1.0);
        }

        px[0] = (rgb[0] * 255.0).round() as u8;
        px[1] = (rgb[1] * 255.0).round() as u8;
        px[2] = (rgb[2] * 255.0).round() as u8;
    }
    out
}
