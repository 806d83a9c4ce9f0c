//! Separator line scanning and tolerance clustering

use image::GrayImage;

/// Samples brighter than this count toward a separator
pub const SEPARATOR_INTENSITY: u8 = 200;
/// Fraction of a row/column that must be bright to mark a separator
pub const SEPARATOR_COVERAGE: f32 = 0.8;
/// Maximum gap (pixels) between candidates of one separator group
pub const GROUP_TOLERANCE: u32 = 5;

/// Candidate separator positions, ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCandidates {
    /// Row indices (y)
    pub horizontal: Vec<u32>,
    /// Column indices (x)
    pub vertical: Vec<u32>,
}

impl LineCandidates {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }
}

/// Mark rows and columns that are mostly bright
///
/// This is a whitespace-density test: uniform light bands (gutters, blank
/// rows) qualify, dark ruled borders do not. A row qualifies when strictly
/// more than 80% of its samples exceed [`SEPARATOR_INTENSITY`]; columns are
/// tested against the image height the same way.
pub fn scan_separator_lines(gray: &GrayImage) -> LineCandidates {
    let (width, height) = gray.dimensions();
    let mut row_counts = vec![0u32; height as usize];
    let mut column_counts = vec![0u32; width as usize];

    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] > SEPARATOR_INTENSITY {
            row_counts[y as usize] += 1;
            column_counts[x as usize] += 1;
        }
    }

    let row_limit = width as f32 * SEPARATOR_COVERAGE;
    let column_limit = height as f32 * SEPARATOR_COVERAGE;

    LineCandidates {
        horizontal: positions_above(&row_counts, row_limit),
        vertical: positions_above(&column_counts, column_limit),
    }
}

fn positions_above(counts: &[u32], limit: f32) -> Vec<u32> {
    counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count as f32 > limit)
        .map(|(i, _)| i as u32)
        .collect()
}

/// Collapse runs of nearby positions to their first member
///
/// Positions must be ascending. A new group starts whenever a position is
/// more than `tolerance` past the previous group's representative.
pub fn group_consecutive_lines(positions: &[u32], tolerance: u32) -> Vec<u32> {
    let mut groups: Vec<u32> = Vec::new();
    for &position in positions {
        match groups.last() {
            Some(&last) if position.saturating_sub(last) <= tolerance => {}
            _ => groups.push(position),
        }
    }
    groups
}
