//! Merged-cell heuristics

use super::lines::SEPARATOR_INTENSITY;
use super::TableCell;
use image::GrayImage;

/// Strategy that adjusts cell spans after grid derivation
///
/// Implementations may only change `row_span`/`col_span`; the cell list
/// itself is never resized.
pub trait MergeHeuristic: Send + Sync {
    fn name(&self) -> &'static str;

    /// `region` is the table image; `origin` is its top-left corner in the
    /// page coordinates the cell boxes use
    fn apply(&self, cells: &mut [TableCell], region: &GrayImage, origin: (f32, f32));
}

/// Flags nearly empty, elongated cells as two-cell spans
///
/// A cell with fewer than `min_pixels` bright samples inside its own area is
/// treated as merged: `col_span = 2` when it is more than `aspect_ratio`
/// times wider than high, `row_span = 2` when the inverse holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseCellMerge {
    pub min_pixels: usize,
    pub aspect_ratio: f32,
}

impl Default for SparseCellMerge {
    fn default() -> Self {
        Self {
            min_pixels: 10,
            aspect_ratio: 2.0,
        }
    }
}

impl MergeHeuristic for SparseCellMerge {
    fn name(&self) -> &'static str {
        "sparse-cell"
    }

    fn apply(&self, cells: &mut [TableCell], region: &GrayImage, origin: (f32, f32)) {
        let mut merged = 0usize;
        for cell in cells.iter_mut() {
            if bright_pixels_in_cell(cell, region, origin) >= self.min_pixels {
                continue;
            }

            let (w, h) = (cell.bbox.width, cell.bbox.height);
            if w > h * self.aspect_ratio {
                cell.col_span = 2;
                merged += 1;
            } else if h > w * self.aspect_ratio {
                cell.row_span = 2;
                merged += 1;
            }
        }

        if merged > 0 {
            tracing::debug!("Flagged {} possibly merged cells", merged);
        }
    }
}

/// Count samples brighter than the separator intensity inside the cell's
/// pixel area `[x, x + w) x [y, y + h)`, clipped to the region
pub fn bright_pixels_in_cell(cell: &TableCell, region: &GrayImage, origin: (f32, f32)) -> usize {
    let mut local = cell.bbox;
    local.x -= origin.0;
    local.y -= origin.1;

    let Some((x0, y0, w, h)) = local.clip_to(region.width(), region.height()) else {
        return 0;
    };

    (y0..y0 + h)
        .flat_map(|y| (x0..x0 + w).map(move |x| (x, y)))
        .filter(|&(x, y)| region.get_pixel(x, y).0[0] > SEPARATOR_INTENSITY)
        .count()
}
