//! Text recognition hand-off
//!
//! The pipeline stops at cleaned pages, regions and table grids. A
//! [`RegionRecognizer`] turns those boxes into text; [`attach_text`] writes
//! the results back into a [`PageAnalysis`].

use crate::error::PipelineError;
use crate::pipeline::PageAnalysis;
use crate::region::{BoundingBox, RegionType};
use image::DynamicImage;
use serde::Serialize;

/// Text recognized inside one box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedText {
    pub bbox: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

/// Capability interface for OCR engines
pub trait RegionRecognizer: Send + Sync {
    /// Engine identifier (e.g., "ocrs")
    fn name(&self) -> &'static str;

    /// Recognize the text of each box on `page`, one result per box
    fn recognize(
        &self,
        page: &DynamicImage,
        boxes: &[BoundingBox],
    ) -> Result<Vec<RecognizedText>, PipelineError>;
}

/// Recognize table cells and text regions of an analyzed page
///
/// Cell text is written into the table cells in place. Text, header and
/// footer regions are returned in reading order.
pub fn attach_text(
    recognizer: &dyn RegionRecognizer,
    analysis: &mut PageAnalysis,
) -> Result<Vec<RecognizedText>, PipelineError> {
    let page = DynamicImage::ImageLuma8(analysis.preprocessing.processed_image.clone());

    for table in &mut analysis.tables {
        let boxes: Vec<BoundingBox> = table.cells.iter().map(|c| c.bbox).collect();
        let texts = recognizer.recognize(&page, &boxes)?;
        for (cell, recognized) in table.cells.iter_mut().zip(texts) {
            if !recognized.text.is_empty() {
                cell.text = Some(recognized.text);
            }
        }
    }

    let mut regions: Vec<_> = analysis
        .preprocessing
        .layout_regions
        .iter()
        .filter(|r| {
            matches!(
                r.region_type,
                RegionType::Text | RegionType::Header | RegionType::Footer
            )
        })
        .collect();
    regions.sort_by_key(|r| r.reading_order);

    let boxes: Vec<BoundingBox> = regions.iter().map(|r| r.bbox).collect();
    let texts = recognizer.recognize(&page, &boxes)?;

    tracing::info!(
        "Recognized {} regions and {} tables with {}",
        texts.len(),
        analysis.tables.len(),
        recognizer.name()
    );
    Ok(texts)
}

/// Score recognized text by how plausible it looks
///
/// ocrs reports no per-character confidence, so the score is built from
/// glyph mix, token shape and character runs. Numeric content (assay
/// values, depths, coordinates) is treated as well-formed.
pub fn text_confidence(text: &str) -> f32 {
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return 0.0;
    }
    if total < 4 {
        return 0.5;
    }

    let plausible = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_ascii_punctuation() || "°±%µ".contains(*c))
        .count();
    let glyph_score = plausible as f32 / total as f32;

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let stray = tokens
        .iter()
        .filter(|t| t.chars().count() == 1 && !t.chars().all(|c| c.is_ascii_digit()))
        .count();
    let token_score = 1.0 - (stray as f32 / tokens.len() as f32).min(0.6);

    let run_score = match longest_run(text) {
        0..=3 => 1.0,
        4..=6 => 0.7,
        _ => 0.3,
    };

    (0.5 * glyph_score + 0.3 * token_score + 0.2 * run_score).clamp(0.0, 1.0)
}

/// Longest run of one repeated non-space character
fn longest_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev = None;

    for c in text.chars() {
        if c.is_whitespace() {
            current = 0;
        } else if Some(c) == prev {
            current += 1;
        } else {
            current = 1;
        }
        longest = longest.max(current);
        prev = Some(c);
    }
    longest
}

#[cfg(feature = "engine-ocrs")]
pub use self::ocrs_backend::OcrsRecognizer;

#[cfg(feature = "engine-ocrs")]
mod ocrs_backend {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::store;
    use ocrs::{DecodeMethod, ImageSource, OcrEngine, OcrEngineParams};
    use rten::Model;
    use std::path::Path;

    /// Mirror of the published ocrs models
    pub const OCRS_MODEL_BASE_URL: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";
    const DETECTION_MODEL_FILE: &str = "text-detection.rten";
    const RECOGNITION_MODEL_FILE: &str = "text-recognition.rten";

    /// Recognizer wrapping the ocrs detection and recognition models
    pub struct OcrsRecognizer {
        engine: OcrEngine,
    }

    impl OcrsRecognizer {
        /// Load the ocrs models, downloading them when missing
        pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
            let base_url = config.model_base_url.as_deref().unwrap_or(OCRS_MODEL_BASE_URL);
            Self::load(&config.resolved_model_dir(), Some(base_url))
        }

        pub fn load(model_dir: &Path, base_url: Option<&str>) -> Result<Self, PipelineError> {
            tracing::info!("Initializing ocrs recognizer...");

            let detection_model = load_model(model_dir, DETECTION_MODEL_FILE, base_url)?;
            let recognition_model = load_model(model_dir, RECOGNITION_MODEL_FILE, base_url)?;

            let engine = OcrEngine::new(OcrEngineParams {
                detection_model: Some(detection_model),
                recognition_model: Some(recognition_model),
                decode_method: DecodeMethod::Greedy,
                ..Default::default()
            })
            .map_err(|e| {
                PipelineError::ModelUnavailable(format!("Failed to create OCR engine: {}", e))
            })?;

            Ok(Self { engine })
        }

        fn recognize_crop(&self, crop: &DynamicImage) -> Result<String, PipelineError> {
            let rgb = crop.to_rgb8();
            let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
                .map_err(|e| ocr_error("image source", e))?;
            let input = self
                .engine
                .prepare_input(source)
                .map_err(|e| ocr_error("prepare input", e))?;

            let words = self
                .engine
                .detect_words(&input)
                .map_err(|e| ocr_error("detect words", e))?;
            let lines = self.engine.find_text_lines(&input, &words);
            let texts = self
                .engine
                .recognize_text(&input, &lines)
                .map_err(|e| ocr_error("recognize text", e))?;

            Ok(texts
                .iter()
                .flatten()
                .map(|line| line.words().map(|w| w.to_string()).collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    fn load_model(dir: &Path, filename: &str, base_url: Option<&str>) -> Result<Model, PipelineError> {
        let path = store::ensure_model(dir, filename, base_url)?;
        Model::load_file(&path).map_err(|e| {
            PipelineError::ModelUnavailable(format!("Failed to load {}: {}", filename, e))
        })
    }

    fn ocr_error(what: &str, e: impl std::fmt::Display) -> PipelineError {
        PipelineError::InferenceError(format!("ocrs {}: {}", what, e))
    }

    impl RegionRecognizer for OcrsRecognizer {
        fn name(&self) -> &'static str {
            "ocrs"
        }

        fn recognize(
            &self,
            page: &DynamicImage,
            boxes: &[BoundingBox],
        ) -> Result<Vec<RecognizedText>, PipelineError> {
            boxes
                .iter()
                .map(|&bbox| {
                    let text = match bbox.clip_to(page.width(), page.height()) {
                        Some((x, y, w, h)) => self.recognize_crop(&page.crop_imm(x, y, w, h))?,
                        None => String::new(),
                    };
                    let confidence = text_confidence(&text);
                    Ok(RecognizedText {
                        bbox,
                        text,
                        confidence,
                    })
                })
                .collect()
        }
    }
}
