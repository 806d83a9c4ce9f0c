//! Document image analysis for scanned mining reports
//!
//! Turns a raw page image into a cleaned page, an orientation, ordered
//! layout regions, a document type and recovered table grids, ready to be
//! handed to an OCR engine.

pub mod classify;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod preprocessing;
pub mod region;
pub mod table;

pub use classify::{Classification, DocumentType};
pub use config::{PipelineConfig, TableConfig, TableSize};
pub use error::{ErrorResponse, PipelineError};
pub use models::{ModelSet, Orientation};
pub use pipeline::{PageAnalysis, PreprocessingResult, Preprocessor};
pub use region::{BoundingBox, LayoutRegion, RegionType};
pub use table::{TableCell, TableColumn, TableDetectionResult, TableExtractor, TableRow, TableStructure};
