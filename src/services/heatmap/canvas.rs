use image::{Rgb, RgbImage};

use super::glyphs::{self, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::grid::{HeatmapGrid, DAYS_PER_WEEK};

pub const BACKGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
pub const NO_DATA: Rgb<u8> = Rgb([0xEB, 0xED, 0xF0]);
const TEXT: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);

const CELL: u32 = 14;
const GAP: u32 = 2;
const MARGIN: u32 = 12;
const FONT_SCALE: u32 = 2;
const CHAR_ADVANCE: u32 = (GLYPH_WIDTH + 1) * FONT_SCALE;
const TEXT_HEIGHT: u32 = GLYPH_HEIGHT * FONT_SCALE;

const WEEKDAYS: [&str; DAYS_PER_WEEK] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// One legend row: ASCII name and swatch color.
pub type LegendEntry = (&'static str, [u8; 3]);

/// Pixel geometry of a rendered heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub grid_left: u32,
    pub grid_top: u32,
    pub legend_left: u32,
    pub width: u32,
    pub height: u32,
}

impl Layout {
    pub fn new(columns: usize, legend: &[LegendEntry]) -> Self {
        let pitch = CELL + GAP;
        let grid_left = MARGIN + 3 * CHAR_ADVANCE + GAP * 2;
        let grid_top = MARGIN + TEXT_HEIGHT + MARGIN;
        let grid_right = grid_left + columns as u32 * pitch;
        let grid_bottom = grid_top + DAYS_PER_WEEK as u32 * pitch;

        let legend_left = grid_right + MARGIN;
        // legend rows plus the trailing "no data" row
        let legend_rows = legend.len() as u32 + 1;
        let legend_bottom = grid_top + legend_rows * pitch;
        let longest = legend
            .iter()
            .map(|(name, _)| name.len())
            .chain(std::iter::once("no data".len()))
            .max()
            .unwrap_or_default() as u32;

        Self {
            grid_left,
            grid_top,
            legend_left,
            width: legend_left + CELL + GAP * 3 + longest * CHAR_ADVANCE + MARGIN,
            height: grid_bottom.max(legend_bottom) + MARGIN,
        }
    }

    /// Top-left pixel of the cell at (`row`, `col`).
    pub fn cell_origin(&self, row: usize, col: usize) -> (u32, u32) {
        let pitch = CELL + GAP;
        (
            self.grid_left + col as u32 * pitch,
            self.grid_top + row as u32 * pitch,
        )
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let cx = x + i as u32 * CHAR_ADVANCE;
        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..GLYPH_WIDTH {
                if glyphs::is_set(c, gx, gy) {
                    fill_rect(
                        img,
                        cx + gx * FONT_SCALE,
                        y + gy * FONT_SCALE,
                        FONT_SCALE,
                        FONT_SCALE,
                        color,
                    );
                }
            }
        }
    }
}

/// Draws title, weekday labels, the cell grid and the legend.
///
/// `palette` holds one color per domain value of the grid's field, indexed
/// by domain index; `legend` lists the entries to explain, in order.
pub fn draw(grid: &HeatmapGrid, palette: &[[u8; 3]], legend: &[LegendEntry]) -> RgbImage {
    let layout = Layout::new(grid.columns, legend);
    let mut img = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);

    let title = format!("{} {}", grid.year, grid.field.as_str());
    draw_text(&mut img, MARGIN, MARGIN, &title, TEXT);

    for (row, name) in WEEKDAYS.iter().enumerate() {
        let (_, y) = layout.cell_origin(row, 0);
        draw_text(&mut img, MARGIN, y + (CELL - TEXT_HEIGHT) / 2, name, TEXT);
    }

    for col in 0..grid.columns {
        for row in 0..DAYS_PER_WEEK {
            if !grid.in_year(row, col) {
                continue;
            }
            let color = grid
                .get(row, col)
                .and_then(|idx| palette.get(idx))
                .map(|c| Rgb(*c))
                .unwrap_or(NO_DATA);
            let (x, y) = layout.cell_origin(row, col);
            fill_rect(&mut img, x, y, CELL, CELL, color);
        }
    }

    let pitch = CELL + GAP;
    let rows = legend
        .iter()
        .map(|(name, color)| (*name, Rgb(*color)))
        .chain(std::iter::once(("no data", NO_DATA)));
    for (i, (name, color)) in rows.enumerate() {
        let y = layout.grid_top + i as u32 * pitch;
        fill_rect(&mut img, layout.legend_left, y, CELL, CELL, color);
        draw_text(
            &mut img,
            layout.legend_left + CELL + GAP * 3,
            y + (CELL - TEXT_HEIGHT) / 2,
            name,
            TEXT,
        );
    }

    img
}
