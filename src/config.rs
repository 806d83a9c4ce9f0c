use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default long-edge bound applied by the normalizer
pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 4096;
/// Default minimum layout detection score
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Minimum table size accepted by whole-page discovery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSize {
    pub width: u32,
    pub height: u32,
}

/// Table extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub min_confidence: f32,
    pub min_table_size: TableSize,
    pub detect_merged_cells: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.75,
            min_table_size: TableSize {
                width: 100,
                height: 50,
            },
            detect_merged_cells: true,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_image_size: u32,
    pub confidence_threshold: f32,
    /// Accepted for compatibility; inference always runs on the CPU backend
    pub enable_gpu: bool,
    pub deskew: bool,
    /// Directory holding `orientation.rten` and `layout.rten`
    pub model_dir: Option<PathBuf>,
    /// Base URL models are fetched from when missing locally
    pub model_base_url: Option<String>,
    pub table: TableConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            enable_gpu: false,
            deskew: false,
            model_dir: None,
            model_base_url: None,
            table: TableConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Resolve the model directory, defaulting to the user cache
    pub fn resolved_model_dir(&self) -> PathBuf {
        self.model_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("minedoc-vision")
                .join("models")
        })
    }
}
