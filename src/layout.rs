use image::{Rgba, RgbaImage, imageops};

use crate::error::EngineError;

/// Scale factor used for the interactive preview rendition of the page.
pub const PREVIEW_SCALE: f32 = 0.25;

const CM_PER_INCH: f32 = 2.54;
/// Physical page margin. Converted to pixels at the configured resolution,
/// never stored as a pixel constant.
const MARGIN_CM: f32 = 0.5;

/// Physical inputs the whole grid geometry is derived from.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub page_width_cm: f32,
    pub page_height_cm: f32,
    pub cell_width_cm: f32,
    pub cell_height_cm: f32,
    pub dpi: f32,
    pub columns: u32,
}

impl Default for PageSpec {
    /// A4 sheet of 3.5 x 4.5 cm passport photos at 300 DPI, five per row.
    fn default() -> Self {
        Self {
            page_width_cm: 21.0,
            page_height_cm: 29.7,
            cell_width_cm: 3.5,
            cell_height_cm: 4.5,
            dpi: 300.0,
            columns: 5,
        }
    }
}

/// Pixel geometry derived from a [`PageSpec`].
///
/// Spacing stays fractional so the last column's right edge lands exactly at
/// `page_width - margin` (and likewise for the last row vertically) for any
/// page/cell/resolution combination; positions are rounded only at blit time.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    pub page_width: u32,
    pub page_height: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub margin: u32,
    pub columns: u32,
    pub max_rows: u32,
    pub spacing_x: f32,
    pub spacing_y: f32,
}

impl GridLayout {
    pub fn compute(spec: &PageSpec) -> Result<Self, EngineError> {
        let px = |cm: f32| (cm / CM_PER_INCH * spec.dpi).round() as u32;
        let page_width = px(spec.page_width_cm);
        let page_height = px(spec.page_height_cm);
        let cell_width = px(spec.cell_width_cm);
        let cell_height = px(spec.cell_height_cm);
        let margin = px(MARGIN_CM);
        let columns = spec.columns.max(1);

        let usable_width = page_width.saturating_sub(2 * margin);
        let usable_height = page_height.saturating_sub(2 * margin);
        if cell_width == 0
            || cell_height == 0
            || columns * cell_width > usable_width
            || cell_height > usable_height
        {
            return Err(EngineError::LayoutOverflow {
                columns,
                cell_width,
                page_width,
            });
        }

        let max_rows = usable_height / cell_height;
        let spacing_x = if columns > 1 {
            (usable_width - columns * cell_width) as f32 / (columns - 1) as f32
        } else {
            0.0
        };
        let spacing_y = if max_rows > 1 {
            (usable_height - max_rows * cell_height) as f32 / (max_rows - 1) as f32
        } else {
            0.0
        };

        Ok(Self {
            page_width,
            page_height,
            cell_width,
            cell_height,
            margin,
            columns,
            max_rows,
            spacing_x,
            spacing_y,
        })
    }

    /// Top-left corner of cell (row, col), zero-indexed, in page pixels.
    pub fn position(&self, row: u32, col: u32) -> (f32, f32) {
        (
            self.margin as f32 + col as f32 * (self.cell_width as f32 + self.spacing_x),
            self.margin as f32 + row as f32 * (self.cell_height as f32 + self.spacing_y),
        )
    }

    pub fn clamp_rows(&self, rows: u32) -> u32 {
        rows.clamp(1, self.max_rows)
    }
}

/// Tiles one composed cell onto a white page. The cell is composited once by
/// the caller and blitted `rows * columns` times, so every tile is identical
/// by construction.
pub fn render_page(layout: &GridLayout, cell: &RgbaImage, rows: u32) -> RgbaImage {
    let mut page = RgbaImage::from_pixel(
        layout.page_width,
        layout.page_height,
        Rgba([255, 255, 255, 255]),
    );
    for row in 0..rows.min(layout.max_rows) {
        for col in 0..layout.columns {
            let (x, y) = layout.position(row, col);
            imageops::overlay(&mut page, cell, x.round() as i64, y.round() as i64);
        }
    }
    page
}

/// Reduced-scale rendition of [`render_page`]: same placement math, every
/// coordinate multiplied by `scale`.
pub fn render_preview(layout: &GridLayout, cell: &RgbaImage, rows: u32, scale: f32) -> RgbaImage {
    let scaled = |v: u32| ((v as f32 * scale).round() as u32).max(1);
    let mut page = RgbaImage::from_pixel(
        scaled(layout.page_width),
        scaled(layout.page_height),
        Rgba([255, 255, 255, 255]),
    );
    let small_cell = imageops::resize(
        cell,
        scaled(layout.cell_width),
        scaled(layout.cell_height),
        imageops::FilterType::Triangle,
    );
    for row in 0..rows.min(layout.max_rows) {
        for col in 0..layout.columns {
            let (x, y) = layout.position(row, col);
            imageops::overlay(
                &mut page,
                &small_cell,
                (x * scale).round() as i64,
                (y * scale).round() as i64,
            );
        }
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4_layout() -> GridLayout {
        GridLayout::compute(&PageSpec::default()).expect("A4 spec fits")
    }

    #[test]
    fn a4_constants_match_the_declared_deployment() {
        let layout = a4_layout();
        assert_eq!(layout.page_width, 2480);
        assert_eq!(layout.page_height, 3508);
        assert_eq!(layout.cell_width, 413);
        assert_eq!(layout.cell_height, 531);
        assert_eq!(layout.columns, 5);
        assert_eq!(layout.max_rows, 6);
        assert!(layout.spacing_x >= 0.0);
        assert!(layout.spacing_y >= 0.0);
    }

    #[test]
    fn last_column_touches_the_right_margin_exactly() {
        let layout = a4_layout();
        let (x, _) = layout.position(0, layout.columns - 1);
        assert_eq!(
            x + layout.cell_width as f32,
            (layout.page_width - layout.margin) as f32
        );
    }

    #[test]
    fn every_row_count_fits_inside_the_page() {
        let layout = a4_layout();
        for rows in 1..=6u32 {
            let bottom = layout.margin as f32
                + rows as f32 * layout.cell_height as f32
                + (rows - 1) as f32 * layout.spacing_y;
            assert!(
                bottom <= layout.page_height as f32,
                "{rows} rows overflow: {bottom}"
            );
        }
    }

    #[test]
    fn cells_never_overlap() {
        let layout = a4_layout();
        for col in 1..layout.columns {
            let (prev, _) = layout.position(0, col - 1);
            let (next, _) = layout.position(0, col);
            assert!(next >= prev + layout.cell_width as f32);
        }
        for row in 1..layout.max_rows {
            let (_, prev) = layout.position(row - 1, 0);
            let (_, next) = layout.position(row, 0);
            assert!(next >= prev + layout.cell_height as f32);
        }
    }

    #[test]
    fn preview_tiles_sit_at_the_scaled_full_page_positions() {
        let layout = a4_layout();
        let cell = RgbaImage::from_pixel(layout.cell_width, layout.cell_height, Rgba([0, 0, 0, 255]));
        let page = render_page(&layout, &cell, layout.max_rows);
        let preview = render_preview(&layout, &cell, layout.max_rows, PREVIEW_SCALE);

        for row in 0..layout.max_rows {
            for col in 0..layout.columns {
                let (x, y) = layout.position(row, col);
                // A point just inside each tile maps to a black pixel in both
                // renditions when scaled by exactly the preview factor.
                let (fx, fy) = (x + 2.0, y + 2.0);
                assert_eq!(page.get_pixel(fx.round() as u32, fy.round() as u32).0[0], 0);
                let (px, py) = (
                    ((x * PREVIEW_SCALE).round() + 2.0) as u32,
                    ((y * PREVIEW_SCALE).round() + 2.0) as u32,
                );
                assert_eq!(preview.get_pixel(px, py).0[0], 0, "tile ({row},{col})");
            }
        }
    }

    #[test]
    fn preview_buffer_has_the_scaled_page_size() {
        let layout = a4_layout();
        let cell = RgbaImage::from_pixel(layout.cell_width, layout.cell_height, Rgba([0, 0, 0, 255]));
        let preview = render_preview(&layout, &cell, 2, PREVIEW_SCALE);
        assert_eq!(preview.width(), (layout.page_width as f32 * PREVIEW_SCALE).round() as u32);
        assert_eq!(preview.height(), (layout.page_height as f32 * PREVIEW_SCALE).round() as u32);
    }

    #[test]
    fn page_blits_requested_rows_and_leaves_the_rest_white() {
        let layout = a4_layout();
        let cell = RgbaImage::from_pixel(layout.cell_width, layout.cell_height, Rgba([0, 0, 0, 255]));
        let page = render_page(&layout, &cell, 2);
        assert_eq!(page.width(), layout.page_width);
        assert_eq!(page.height(), layout.page_height);

        let (x0, y0) = layout.position(0, 0);
        assert_eq!(page.get_pixel(x0.round() as u32, y0.round() as u32).0, [0, 0, 0, 255]);
        let (x1, y1) = layout.position(1, 4);
        assert_eq!(page.get_pixel(x1.round() as u32 + 1, y1.round() as u32 + 1).0, [0, 0, 0, 255]);

        // Row 3 was not requested: still white.
        let (x2, y2) = layout.position(2, 0);
        assert_eq!(
            page.get_pixel(x2.round() as u32 + 1, y2.round() as u32 + 1).0,
            [255, 255, 255, 255]
        );
    }

    #[test]
    fn oversized_cells_are_a_layout_error() {
        let spec = PageSpec {
            cell_width_cm: 10.0,
            ..PageSpec::default()
        };
        assert!(GridLayout::compute(&spec).is_err());
    }
}
