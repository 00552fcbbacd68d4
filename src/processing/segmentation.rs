use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;

use crate::error::EngineError;

/// Tunable thresholds for the local background removal.
///
/// These are the main source of false positives/negatives: patterned
/// backgrounds or subjects wearing background-colored clothing will defeat
/// the flat-color model no matter how they are tuned.
#[derive(Debug, Clone, Copy)]
pub struct SegmentationParams {
    /// Euclidean RGB distance below which a pixel counts as background.
    pub color_threshold: f32,
    /// Red-channel deviation from the 4-neighbor mean above which a pixel is
    /// treated as an edge and exempted from full removal.
    pub edge_threshold: f32,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            color_threshold: 35.0,
            edge_threshold: 20.0,
        }
    }
}

/// Local background removal: classifies pixels against a flat background
/// color estimated from the image boundary and clears or ramps their alpha.
///
/// Passport-style portraits frame the subject centrally, so corners and edge
/// midpoints are assumed to show background. The model is a single mean
/// color; it needs a visually uniform backdrop.
pub fn remove_background(
    img: &DynamicImage,
    params: &SegmentationParams,
) -> Result<RgbaImage, EngineError> {
    let src = img.to_rgba8();
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return Err(EngineError::EmptySource);
    }

    let bg = estimate_background(&src);
    let ramp_limit = params.color_threshold * 1.5;

    let mut out = src.clone();
    let stride = w as usize * 4;
    out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let y = y as u32;
        for x in 0..w {
            let px = src.get_pixel(x, y);
            let dist = color_distance(px.0, bg);
            let alpha = &mut row[x as usize * 4 + 3];
            if dist < params.color_threshold && !is_edge(&src, x, y, params.edge_threshold) {
                *alpha = 0;
            } else if dist < ramp_limit {
                // Linear ramp instead of a hard cut, to soften the matte edge.
                *alpha = (255.0 * dist / ramp_limit).round() as u8;
            }
            // Otherwise the pixel keeps its alpha: subject stays opaque.
        }
    });

    Ok(out)
}

/// Mean RGB over a fixed constellation of boundary points: the four corners,
/// two top-edge points, and one point down each vertical edge.
fn estimate_background(src: &RgbaImage) -> [f32; 3] {
    let (w, h) = src.dimensions();
    let samples = [
        (0, 0),
        (w - 1, 0),
        (0, h - 1),
        (w - 1, h - 1),
        (w / 4, 0),
        ((w as u64 * 3 / 4) as u32, 0),
        (0, h / 4),
        (w - 1, h / 4),
    ];

    let mut sum = [0.0f32; 3];
    for (x, y) in samples {
        let px = src.get_pixel(x, y);
        for c in 0..3 {
            sum[c] += px[c] as f32;
        }
    }
    sum.map(|v| (v / samples.len() as f32).round())
}

fn color_distance(px: [u8; 4], bg: [f32; 3]) -> f32 {
    let dr = px[0] as f32 - bg[0];
    let dg = px[1] as f32 - bg[1];
    let db = px[2] as f32 - bg[2];
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Interior pixels whose red channel deviates from the mean of their four
/// axis-adjacent neighbors count as edges; boundary pixels never do.
fn is_edge(src: &RgbaImage, x: u32, y: u32, threshold: f32) -> bool {
    let (w, h) = src.dimensions();
    if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
        return false;
    }
    let mean = (src.get_pixel(x, y - 1)[0] as f32
        + src.get_pixel(x, y + 1)[0] as f32
        + src.get_pixel(x - 1, y)[0] as f32
        + src.get_pixel(x + 1, y)[0] as f32)
        / 4.0;
    (src.get_pixel(x, y)[0] as f32 - mean).abs() > threshold
}
