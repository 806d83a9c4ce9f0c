//! Table structure extraction
//!
//! Recovers a row/column grid from a raster table region using separator
//! scanning, tolerance clustering and a pluggable merged-cell heuristic.
//! Whole-page discovery is available for pages without a layout model.

pub mod grid;
pub mod lines;
pub mod merge;

pub use lines::{group_consecutive_lines, scan_separator_lines, LineCandidates};
pub use merge::{MergeHeuristic, SparseCellMerge};

use crate::config::TableConfig;
use crate::preprocessing::steps;
use crate::region::BoundingBox;
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Placeholder confidence of a table found by whole-page discovery
pub const DISCOVERED_TABLE_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub index: usize,
    pub y: f32,
    pub height: f32,
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub index: usize,
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub row_index: usize,
    pub column_index: usize,
    pub row_span: u32,
    pub col_span: u32,
    pub bbox: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub confidence: f32,
}

/// Recovered grid of one table region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStructure {
    pub bbox: BoundingBox,
    pub rows: Vec<TableRow>,
    pub columns: Vec<TableColumn>,
    pub cells: Vec<TableCell>,
    pub confidence: f32,
    pub header_row_count: usize,
}

impl TableStructure {
    /// A table with no recovered grid yet
    pub fn empty(bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            bbox,
            rows: Vec::new(),
            columns: Vec::new(),
            cells: Vec::new(),
            confidence,
            header_row_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Result of whole-page table discovery
#[derive(Debug, Clone, Serialize)]
pub struct TableDetectionResult {
    pub tables: Vec<TableStructure>,
    pub total_tables_found: usize,
    pub processing_time_ms: u64,
}

/// Table structure extractor
#[derive(Clone)]
pub struct TableExtractor {
    config: TableConfig,
    merge: Arc<dyn MergeHeuristic>,
}

impl TableExtractor {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            merge: Arc::new(SparseCellMerge::default()),
        }
    }

    /// Swap the merged-cell strategy
    pub fn with_merge_heuristic(mut self, merge: Arc<dyn MergeHeuristic>) -> Self {
        self.merge = merge;
        self
    }

    /// Recover the grid of a table region
    ///
    /// `bbox` places the region on the page; row, column and cell positions
    /// are reported in page coordinates. A region without separator lines
    /// yields an empty grid carrying the supplied `confidence`.
    pub fn extract(
        &self,
        region: &DynamicImage,
        bbox: BoundingBox,
        confidence: f32,
    ) -> TableStructure {
        let gray = steps::normalize::apply(region.to_luma8());
        self.extract_gray(&gray, bbox, confidence)
    }

    /// Same as [`extract`](Self::extract) for an already normalized region
    pub fn extract_gray(&self, gray: &GrayImage, bbox: BoundingBox, confidence: f32) -> TableStructure {
        let lines = scan_separator_lines(gray);
        let horizontal = group_consecutive_lines(&lines.horizontal, lines::GROUP_TOLERANCE);
        let vertical = group_consecutive_lines(&lines.vertical, lines::GROUP_TOLERANCE);

        let rows = grid::derive_rows(&horizontal, bbox.y);
        let columns = grid::derive_columns(&vertical, bbox.x);
        let mut cells = grid::generate_cells(&rows, &columns);

        if self.config.detect_merged_cells && !cells.is_empty() {
            self.merge.apply(&mut cells, gray, (bbox.x, bbox.y));
        }

        tracing::debug!(
            "Table structure: {} rows x {} columns = {} cells",
            rows.len(),
            columns.len(),
            cells.len()
        );

        let header_row_count = rows.iter().filter(|r| r.is_header).count();
        TableStructure {
            bbox,
            rows,
            columns,
            cells,
            confidence,
            header_row_count,
        }
    }

    /// Discover and extract tables across a whole page
    pub fn detect_tables(&self, page: &DynamicImage) -> TableDetectionResult {
        let start = Instant::now();
        let gray = steps::normalize::apply(page.to_luma8());

        let lines = scan_separator_lines(&gray);
        let grids = grid::find_table_grids(
            &lines,
            gray.width(),
            gray.height(),
            self.config.min_table_size,
        );

        let tables: Vec<TableStructure> = if DISCOVERED_TABLE_CONFIDENCE < self.config.min_confidence {
            tracing::debug!(
                "Discarding {} grids below minimum confidence {}",
                grids.len(),
                self.config.min_confidence
            );
            Vec::new()
        } else {
            grids
                .into_iter()
                .filter_map(|bbox| {
                    let (x, y, w, h) = bbox.clip_to(gray.width(), gray.height())?;
                    let crop = page.crop_imm(x, y, w, h);
                    Some(self.extract(&crop, bbox, DISCOVERED_TABLE_CONFIDENCE))
                })
                .collect()
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Found {} tables in {}ms",
            tables.len(),
            processing_time_ms
        );

        TableDetectionResult {
            total_tables_found: tables.len(),
            tables,
            processing_time_ms,
        }
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
