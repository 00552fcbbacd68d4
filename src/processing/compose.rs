use image::{Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};

use crate::state::{EditState, WHITE};

use super::filters;

/// Cover-fit overfill: the subject is scaled 20% past the cell so rotation,
/// zoom, and pan inside the supported ranges never expose a gap at the cell
/// edge. The excess is cropped.
const COVER_OVERFILL: f32 = 1.2;

const SHADOW_ON_DARK: [u8; 3] = [0x55, 0x55, 0x55];
const SHADOW_ON_WHITE: [u8; 3] = [0xE0, 0xE0, 0xE0];
const SHADOW_OPACITY: f32 = 0.3;

/// Draws one finished passport photo into a `width` x `height` cell.
///
/// Order matters: background fill, color filters on the subject only,
/// rotation and zoom about the cell center, cover-fit placement with pan
/// offsets, then the border on top, untouched by filters or geometry.
/// Without a source image the result is a blank buffer of the requested
/// size; no input inside the declared domains panics.
pub fn compose_cell(state: &EditState, width: u32, height: u32) -> RgbaImage {
    let Some(source) = state.active_image() else {
        return RgbaImage::new(width, height);
    };

    let mut cell = RgbaImage::from_pixel(
        width,
        height,
        Rgba([
            state.background_color[0],
            state.background_color[1],
            state.background_color[2],
            255,
        ]),
    );

    let subject = filters::apply(source.to_rgba8(), state);
    let (img_w, img_h) = subject.dimensions();
    if img_w == 0 || img_h == 0 {
        return cell;
    }

    // Cover-fit: overfill along the limiting dimension, center, then pan.
    let img_aspect = img_w as f32 / img_h as f32;
    let cell_aspect = width as f32 / height as f32;
    let (draw_w, draw_h) = if img_aspect > cell_aspect {
        let h = height as f32 * COVER_OVERFILL;
        (h * img_aspect, h)
    } else {
        let w = width as f32 * COVER_OVERFILL;
        (w, w / img_aspect)
    };
    let draw_x = (width as f32 - draw_w) / 2.0 + state.offset_x;
    let draw_y = (height as f32 - draw_h) / 2.0 + state.offset_y;

    let scaled = imageops::resize(
        &subject,
        (draw_w.round() as u32).max(1),
        (draw_h.round() as u32).max(1),
        imageops::FilterType::CatmullRom,
    );
    let mut staged = RgbaImage::new(width, height);
    imageops::overlay(&mut staged, &scaled, draw_x.round() as i64, draw_y.round() as i64);

    // Rotation and zoom pivot on the cell center regardless of pan.
    let staged = if state.rotation_degrees != 0.0 || state.zoom != 1.0 {
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let projection = Projection::translate(cx, cy)
            * Projection::rotate(state.rotation_degrees.to_radians())
            * Projection::scale(state.zoom, state.zoom)
            * Projection::translate(-cx, -cy);
        warp(
            &staged,
            &projection,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        )
    } else {
        staged
    };

    imageops::overlay(&mut cell, &staged, 0, 0);

    if state.border_width > 0 {
        draw_border(&mut cell, state);
    }

    cell
}

fn draw_border(cell: &mut RgbaImage, state: &EditState) {
    let bw = state.border_width;
    for inset in 0..bw {
        stroke_rect(cell, inset, state.border_color);
    }
    // Wide borders get a faint inner line simulating a printed photo's
    // inset shadow, in a color that reads against the border.
    if bw >= 3 {
        let shadow = if state.border_color == WHITE {
            SHADOW_ON_WHITE
        } else {
            SHADOW_ON_DARK
        };
        stroke_rect_blended(cell, bw + 1, shadow, SHADOW_OPACITY);
    }
}

/// One-pixel rectangle outline at `inset` pixels from the cell edge.
fn stroke_rect(img: &mut RgbaImage, inset: u32, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    if 2 * inset >= w || 2 * inset >= h {
        return;
    }
    let px = Rgba([color[0], color[1], color[2], 255]);
    let (right, bottom) = (w - 1 - inset, h - 1 - inset);
    for x in inset..=right {
        img.put_pixel(x, inset, px);
        img.put_pixel(x, bottom, px);
    }
    for y in inset..=bottom {
        img.put_pixel(inset, y, px);
        img.put_pixel(right, y, px);
    }
}

fn stroke_rect_blended(img: &mut RgbaImage, inset: u32, color: [u8; 3], opacity: f32) {
    let (w, h) = img.dimensions();
    if 2 * inset >= w || 2 * inset >= h {
        return;
    }
    let mut blend = |x: u32, y: u32| {
        let px = img.get_pixel_mut(x, y);
        for c in 0..3 {
            px[c] = (px[c] as f32 * (1.0 - opacity) + color[c] as f32 * opacity).round() as u8;
        }
    };
    let (right, bottom) = (w - 1 - inset, h - 1 - inset);
    for x in inset..=right {
        blend(x, inset);
        blend(x, bottom);
    }
    for y in inset + 1..bottom {
        blend(inset, y);
        blend(right, y);
    }
}
