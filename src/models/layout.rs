//! Layout region detection and reading-order assignment

use crate::error::PipelineError;
use crate::region::{BoundingBox, LayoutRegion, RegionType};
use image::GrayImage;
use std::sync::Arc;

/// Square input side of the layout detector
pub const LAYOUT_INPUT_SIZE: u32 = 640;
/// Vertical distance within which regions share a reading row
pub const ROW_TOLERANCE: f32 = 20.0;

/// Raw detector output in page pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub score: f32,
}

/// Capability interface for layout detectors
pub trait LayoutModel: Send + Sync {
    /// Model identifier (e.g., "rten", "null")
    fn name(&self) -> &'static str;

    /// Whether this model can produce detections at all
    fn is_available(&self) -> bool {
        true
    }

    /// Detect regions on a normalized grayscale page
    fn predict(&self, image: &GrayImage) -> Result<Vec<Detection>, PipelineError>;
}

/// Fallback used when no trained detector is available
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLayoutModel;

impl LayoutModel for NullLayoutModel {
    fn name(&self) -> &'static str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn predict(&self, _image: &GrayImage) -> Result<Vec<Detection>, PipelineError> {
        Ok(Vec::new())
    }
}

#[cfg(feature = "rten-models")]
pub use self::rten_backend::RtenLayoutModel;

#[cfg(feature = "rten-models")]
mod rten_backend {
    use super::*;
    use crate::models::to_nchw;
    use rten::Model;
    use rten_tensor::prelude::*;
    use rten_tensor::NdTensor;
    use std::path::Path;

    /// Object detector backed by an `.rten` model
    ///
    /// Input is `[1, 3, 640, 640]` in `[0, 1]`. The first three outputs are
    /// boxes `[1, N, 4]` as normalized `(y1, x1, y2, x2)`, scores `[1, N]`
    /// and class ids `[1, N]`.
    pub struct RtenLayoutModel {
        model: Model,
    }

    impl RtenLayoutModel {
        pub fn load(path: &Path) -> Result<Self, PipelineError> {
            let model = Model::load_file(path).map_err(|e| {
                PipelineError::ModelUnavailable(format!(
                    "Failed to load layout model {:?}: {}",
                    path, e
                ))
            })?;
            Ok(Self { model })
        }
    }

    fn inference_error<E: std::fmt::Debug>(what: &'static str) -> impl FnOnce(E) -> PipelineError {
        move |e| PipelineError::InferenceError(format!("layout {}: {:?}", what, e))
    }

    impl LayoutModel for RtenLayoutModel {
        fn name(&self) -> &'static str {
            "rten"
        }

        fn predict(&self, image: &GrayImage) -> Result<Vec<Detection>, PipelineError> {
            let input_id = *self.model.input_ids().first().ok_or_else(|| {
                PipelineError::InferenceError("layout model has no inputs".to_string())
            })?;
            let output_ids = self.model.output_ids();
            if output_ids.len() < 3 {
                return Err(PipelineError::InferenceError(format!(
                    "layout model has {} outputs, expected boxes, scores and classes",
                    output_ids.len()
                )));
            }

            let side = LAYOUT_INPUT_SIZE as usize;
            let input = NdTensor::from_data([1, 3, side, side], to_nchw(image, LAYOUT_INPUT_SIZE));

            let mut outputs = self
                .model
                .run(vec![(input_id, input.view().into())], &output_ids[..3], None)
                .map_err(inference_error("model"))?
                .into_iter();

            let missing = || PipelineError::InferenceError("missing layout output".to_string());
            let boxes: NdTensor<f32, 3> = outputs
                .next()
                .ok_or_else(missing)?
                .try_into()
                .map_err(inference_error("boxes"))?;
            let scores: NdTensor<f32, 2> = outputs
                .next()
                .ok_or_else(missing)?
                .try_into()
                .map_err(inference_error("scores"))?;
            let classes: NdTensor<f32, 2> = outputs
                .next()
                .ok_or_else(missing)?
                .try_into()
                .map_err(inference_error("classes"))?;

            let (width, height) = (image.width() as f32, image.height() as f32);
            let count = scores.size(1).min(boxes.size(1)).min(classes.size(1));

            let detections = (0..count)
                .map(|i| {
                    let (y1, x1) = (boxes[[0, i, 0]], boxes[[0, i, 1]]);
                    let (y2, x2) = (boxes[[0, i, 2]], boxes[[0, i, 3]]);
                    Detection {
                        bbox: BoundingBox::new(
                            x1 * width,
                            y1 * height,
                            (x2 - x1) * width,
                            (y2 - y1) * height,
                        ),
                        class_id: classes[[0, i]].max(0.0) as usize,
                        score: scores[[0, i]],
                    }
                })
                .collect();

            Ok(detections)
        }
    }
}

/// Layout stage: filters detections by confidence, maps class ids and
/// assigns reading order
#[derive(Clone)]
pub struct LayoutDetector {
    model: Arc<dyn LayoutModel>,
    confidence_threshold: f32,
}

impl LayoutDetector {
    pub fn new(model: Arc<dyn LayoutModel>, confidence_threshold: f32) -> Self {
        Self {
            model,
            confidence_threshold,
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_available()
    }

    pub fn detect(&self, image: &GrayImage) -> Result<Vec<LayoutRegion>, PipelineError> {
        let detections = self.model.predict(image)?;
        let total = detections.len();

        let regions: Vec<LayoutRegion> = detections
            .into_iter()
            .filter(|d| d.score >= self.confidence_threshold)
            .map(|d| LayoutRegion {
                region_type: RegionType::from_class_id(d.class_id),
                bbox: d.bbox,
                confidence: d.score,
                reading_order: 0,
            })
            .collect();

        tracing::debug!(
            "Layout model '{}' kept {} of {} detections (threshold {})",
            self.model.name(),
            regions.len(),
            total,
            self.confidence_threshold
        );

        Ok(sort_reading_order(regions, ROW_TOLERANCE))
    }
}

/// Order regions top-to-bottom, then left-to-right within a row
///
/// Regions are walked by `y`; a region joins the current row while its `y`
/// is within `tolerance` of the row's first region. Inside a row only `x`
/// matters. `reading_order` is set to the final position.
pub fn sort_reading_order(mut regions: Vec<LayoutRegion>, tolerance: f32) -> Vec<LayoutRegion> {
    regions.sort_by(|a, b| a.bbox.y.total_cmp(&b.bbox.y));

    let mut rows: Vec<Vec<LayoutRegion>> = Vec::new();
    for region in regions {
        match rows.last_mut() {
            Some(row) if region.bbox.y - row[0].bbox.y <= tolerance => row.push(region),
            _ => rows.push(vec![region]),
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|a, b| a.bbox.x.total_cmp(&b.bbox.x));
            row
        })
        .enumerate()
        .map(|(order, mut region)| {
            region.reading_order = order;
            region
        })
        .collect()
}
