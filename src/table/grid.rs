//! Row, column and cell derivation from separator groups

use super::lines::{group_consecutive_lines, LineCandidates, GROUP_TOLERANCE};
use super::{TableCell, TableColumn, TableRow};
use crate::config::TableSize;
use crate::region::BoundingBox;

/// Placeholder confidence of a freshly generated cell
pub const CELL_CONFIDENCE: f32 = 0.85;
/// Largest fraction of the page a discovered table may span per axis
pub const MAX_PAGE_FRACTION: f32 = 0.95;

/// Candidate table rectangles between adjacent separator groups
///
/// Every pair of adjacent horizontal groups combined with every pair of
/// adjacent vertical groups forms a rectangle; it is kept when it meets
/// `min_size` and does not exceed 95% of the page in either dimension.
pub fn find_table_grids(
    lines: &LineCandidates,
    page_width: u32,
    page_height: u32,
    min_size: TableSize,
) -> Vec<BoundingBox> {
    let horizontal = group_consecutive_lines(&lines.horizontal, GROUP_TOLERANCE);
    let vertical = group_consecutive_lines(&lines.vertical, GROUP_TOLERANCE);

    let max_width = page_width as f32 * MAX_PAGE_FRACTION;
    let max_height = page_height as f32 * MAX_PAGE_FRACTION;

    let mut grids = Vec::new();
    for ys in horizontal.windows(2) {
        for xs in vertical.windows(2) {
            let width = xs[1] - xs[0];
            let height = ys[1] - ys[0];

            if width >= min_size.width
                && height >= min_size.height
                && width as f32 <= max_width
                && height as f32 <= max_height
            {
                grids.push(BoundingBox::new(
                    xs[0] as f32,
                    ys[0] as f32,
                    width as f32,
                    height as f32,
                ));
            }
        }
    }
    grids
}

/// One row between each pair of adjacent horizontal groups, offset to page
/// coordinates; row 0 is the header
pub fn derive_rows(horizontal_groups: &[u32], offset_y: f32) -> Vec<TableRow> {
    horizontal_groups
        .windows(2)
        .enumerate()
        .map(|(index, pair)| TableRow {
            index,
            y: pair[0] as f32 + offset_y,
            height: (pair[1] - pair[0]) as f32,
            is_header: index == 0,
        })
        .collect()
}

/// One column between each pair of adjacent vertical groups
pub fn derive_columns(vertical_groups: &[u32], offset_x: f32) -> Vec<TableColumn> {
    vertical_groups
        .windows(2)
        .enumerate()
        .map(|(index, pair)| TableColumn {
            index,
            x: pair[0] as f32 + offset_x,
            width: (pair[1] - pair[0]) as f32,
        })
        .collect()
}

/// Dense row-major grid of single-span cells
pub fn generate_cells(rows: &[TableRow], columns: &[TableColumn]) -> Vec<TableCell> {
    rows.iter()
        .flat_map(|row| {
            columns.iter().map(move |column| TableCell {
                row_index: row.index,
                column_index: column.index,
                row_span: 1,
                col_span: 1,
                bbox: BoundingBox::new(column.x, row.y, column.width, row.height),
                text: None,
                confidence: CELL_CONFIDENCE,
            })
        })
        .collect()
}
