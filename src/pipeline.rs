//! Async page pipeline
//!
//! Chains normalization, orientation, layout, classification and enhancement
//! for one page, then fans table extraction out over the page's table
//! regions. CPU-bound stages run on tokio's blocking pool.

use crate::classify::{self, DocumentType};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::models::{LayoutDetector, ModelSet, Orientation, OrientationClassifier};
use crate::preprocessing::{EnhancementProfile, Enhancer, Normalizer, StepTiming};
use crate::region::{BoundingBox, LayoutRegion, RegionType};
use crate::table::{TableExtractor, TableStructure};
use futures::future::try_join_all;
use image::{imageops, DynamicImage, GrayImage};
use serde::Serialize;
use std::time::Instant;

/// Output of the preprocessing chain for one page
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    #[serde(skip)]
    pub processed_image: GrayImage,
    /// Otsu-binarized page in the same orientation, for line scanning
    #[serde(skip)]
    pub binary_image: GrayImage,
    pub binary_threshold: u8,
    /// Skew correction applied before inference, in degrees
    pub skew_degrees: f32,
    pub orientation: Orientation,
    pub layout_regions: Vec<LayoutRegion>,
    pub document_type: DocumentType,
    pub confidence: f32,
    pub enhancement_profile: EnhancementProfile,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
    pub stage_timings: Vec<StepTiming>,
}

/// Preprocessing plus the tables recovered from the page
#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    pub preprocessing: PreprocessingResult,
    pub tables: Vec<TableStructure>,
}

/// Preprocessing output together with the rotated page the tables are cut from
struct PreparedPage {
    result: PreprocessingResult,
    rotated: GrayImage,
    layout_active: bool,
}

/// Page pipeline sharing one set of model handles across calls
#[derive(Clone)]
pub struct Preprocessor {
    normalizer: Normalizer,
    orientation: OrientationClassifier,
    layout: LayoutDetector,
    tables: TableExtractor,
}

impl Preprocessor {
    pub fn new(config: PipelineConfig, models: ModelSet) -> Self {
        Self {
            normalizer: Normalizer::new(config.max_image_size, config.deskew),
            orientation: OrientationClassifier::new(models.orientation),
            layout: LayoutDetector::new(models.layout, config.confidence_threshold),
            tables: TableExtractor::new(config.table),
        }
    }

    /// Build a pipeline, loading models through the registry
    pub fn from_config(config: PipelineConfig) -> Self {
        let models = ModelSet::load(&config);
        Self::new(config, models)
    }

    /// Replace the table extractor (e.g., to plug in another merge heuristic)
    pub fn with_table_extractor(mut self, tables: TableExtractor) -> Self {
        self.tables = tables;
        self
    }

    /// Run the preprocessing chain on an encoded page
    pub async fn preprocess(&self, bytes: &[u8]) -> Result<PreprocessingResult, PipelineError> {
        Ok(self.prepare(bytes).await?.result)
    }

    /// Run the preprocessing chain and extract every table on the page
    ///
    /// With an active layout model, each table region is cropped from the
    /// rotated page and extracted concurrently. Without one, tables are
    /// discovered across the whole page.
    pub async fn analyze(&self, bytes: &[u8]) -> Result<PageAnalysis, PipelineError> {
        let PreparedPage {
            result: preprocessing,
            rotated,
            layout_active,
        } = self.prepare(bytes).await?;

        let start = Instant::now();
        let tables = if layout_active {
            let jobs = preprocessing
                .layout_regions
                .iter()
                .filter(|r| r.region_type == RegionType::Table)
                .map(|region| self.extract_region(&rotated, region));
            try_join_all(jobs).await?
        } else {
            let extractor = self.tables.clone();
            let page = DynamicImage::ImageLuma8(rotated);
            blocking(move || extractor.detect_tables(&page)).await?.tables
        };

        tracing::info!(
            "Extracted {} tables in {}ms",
            tables.len(),
            start.elapsed().as_millis()
        );

        Ok(PageAnalysis {
            preprocessing,
            tables,
        })
    }

    fn extract_region(
        &self,
        page: &GrayImage,
        region: &LayoutRegion,
    ) -> impl std::future::Future<Output = Result<TableStructure, PipelineError>> {
        let extractor = self.tables.clone();
        let confidence = region.confidence;
        let crop = region
            .bbox
            .clip_to(page.width(), page.height())
            .map(|(x, y, w, h)| {
                let bbox = BoundingBox::new(x as f32, y as f32, w as f32, h as f32);
                (bbox, imageops::crop_imm(page, x, y, w, h).to_image())
            });
        let fallback = region.bbox;

        async move {
            match crop {
                Some((bbox, image)) => {
                    blocking(move || {
                        extractor.extract(&DynamicImage::ImageLuma8(image), bbox, confidence)
                    })
                    .await
                }
                None => {
                    tracing::debug!("Table region {:?} lies outside the page", fallback);
                    Ok(TableStructure::empty(fallback, confidence))
                }
            }
        }
    }

    async fn prepare(&self, bytes: &[u8]) -> Result<PreparedPage, PipelineError> {
        let start = Instant::now();
        let mut warnings = Vec::new();
        let mut timings = Vec::new();

        // Normalize
        let stage = Instant::now();
        let normalizer = self.normalizer.clone();
        let bytes = bytes.to_vec();
        let page = blocking(move || normalizer.normalize_bytes(&bytes)).await??;
        record(&mut timings, "normalize", stage);

        // Orientation
        let stage = Instant::now();
        if !self.orientation.is_available() {
            warnings.push("orientation model unavailable; assumed 0 degrees".to_string());
        }
        let classifier = self.orientation.clone();
        let gray = page.gray;
        let (gray, predicted) = blocking(move || {
            let predicted = classifier.classify(&gray);
            (gray, predicted)
        })
        .await?;
        let orientation = match predicted {
            Ok(orientation) => orientation,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Orientation inference failed, assuming 0 degrees: {}", e);
                warnings.push(format!("orientation fallback: {}", e));
                Orientation::Deg0
            }
            Err(e) => return Err(e),
        };
        record(&mut timings, "orientation", stage);

        let stage = Instant::now();
        let binary = page.binary;
        let (rotated, binary) = blocking(move || {
            (
                Normalizer::rotate(gray, orientation),
                Normalizer::rotate(binary, orientation),
            )
        })
        .await?;
        record(&mut timings, "rotate", stage);

        // Layout
        let stage = Instant::now();
        let mut layout_active = self.layout.is_available();
        if !layout_active {
            warnings.push("layout model unavailable; no regions detected".to_string());
        }
        let detector = self.layout.clone();
        let (rotated, detected) = blocking(move || {
            let detected = detector.detect(&rotated);
            (rotated, detected)
        })
        .await?;
        let layout_regions = match detected {
            Ok(regions) => regions,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Layout inference failed, continuing without regions: {}", e);
                warnings.push(format!("layout fallback: {}", e));
                layout_active = false;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        record(&mut timings, "layout", stage);

        // Classify
        let stage = Instant::now();
        let classification = classify::classify(&layout_regions);
        record(&mut timings, "classify", stage);

        // Enhance
        let stage = Instant::now();
        let enhancer = Enhancer::for_document(classification.document_type);
        let source = rotated.clone();
        let enhanced = blocking(move || enhancer.process(source)).await??;
        record(&mut timings, "enhance", stage);
        timings.extend(enhanced.steps.into_iter().map(|step| StepTiming {
            name: format!("enhance.{}", step.name),
            time_ms: step.time_ms,
        }));

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Preprocessed page in {}ms: {} degrees, {} regions, {} ({:.2})",
            processing_time_ms,
            orientation.degrees(),
            layout_regions.len(),
            classification.document_type,
            classification.confidence
        );

        Ok(PreparedPage {
            result: PreprocessingResult {
                processed_image: enhanced.image,
                binary_image: binary,
                binary_threshold: page.threshold,
                skew_degrees: page.skew_degrees,
                orientation,
                layout_regions,
                document_type: classification.document_type,
                confidence: classification.confidence,
                enhancement_profile: enhanced.profile,
                processing_time_ms,
                warnings,
                stage_timings: timings,
            },
            rotated,
            layout_active,
        })
    }
}

/// Run a CPU-bound closure on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Internal(format!("blocking task failed: {}", e)))
}

fn record(timings: &mut Vec<StepTiming>, name: &str, started: Instant) {
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: started.elapsed().as_millis() as u64,
    });
}
