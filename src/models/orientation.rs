//! Page orientation classification (0, 90, 180 or 270 degrees)

use crate::error::PipelineError;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Square input side of the orientation classifier
pub const ORIENTATION_INPUT_SIZE: u32 = 224;

/// Discrete page rotation, serialized as degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    /// Map a classifier class index (0..4) to an orientation
    pub fn from_class(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Deg0),
            1 => Some(Self::Deg90),
            2 => Some(Self::Deg180),
            3 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl From<Orientation> for u16 {
    fn from(orientation: Orientation) -> Self {
        orientation.degrees()
    }
}

impl TryFrom<u16> for Orientation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        if degrees % 90 != 0 {
            return Err(format!("{} is not a quarter turn", degrees));
        }
        Self::from_class(degrees as usize / 90).ok_or_else(|| format!("{} is out of range", degrees))
    }
}

/// Capability interface for orientation models
pub trait OrientationModel: Send + Sync {
    /// Model identifier (e.g., "rten", "identity")
    fn name(&self) -> &'static str;

    /// Whether this model actually looks at the page
    fn is_available(&self) -> bool {
        true
    }

    /// Predict the orientation of a normalized grayscale page
    fn predict(&self, image: &GrayImage) -> Result<Orientation, PipelineError>;
}

/// Fallback used when no trained classifier is available
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityOrientation;

impl OrientationModel for IdentityOrientation {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn predict(&self, _image: &GrayImage) -> Result<Orientation, PipelineError> {
        Ok(Orientation::Deg0)
    }
}

/// Index of the largest score; ties go to the lowest index
pub fn arg_max(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if s <= b => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

#[cfg(feature = "rten-models")]
pub use self::rten_backend::RtenOrientationModel;

#[cfg(feature = "rten-models")]
mod rten_backend {
    use super::*;
    use crate::models::to_nchw;
    use rten::Model;
    use rten_tensor::prelude::*;
    use rten_tensor::NdTensor;
    use std::path::Path;

    /// Orientation classifier backed by an `.rten` model
    ///
    /// Expects a `[1, 3, 224, 224]` input in `[0, 1]` and four output logits.
    pub struct RtenOrientationModel {
        model: Model,
    }

    impl RtenOrientationModel {
        pub fn load(path: &Path) -> Result<Self, PipelineError> {
            let model = Model::load_file(path).map_err(|e| {
                PipelineError::ModelUnavailable(format!(
                    "Failed to load orientation model {:?}: {}",
                    path, e
                ))
            })?;
            Ok(Self { model })
        }
    }

    impl OrientationModel for RtenOrientationModel {
        fn name(&self) -> &'static str {
            "rten"
        }

        fn predict(&self, image: &GrayImage) -> Result<Orientation, PipelineError> {
            let side = ORIENTATION_INPUT_SIZE as usize;
            let input = NdTensor::from_data([1, 3, side, side], to_nchw(image, ORIENTATION_INPUT_SIZE));

            let output = self
                .model
                .run_one(input.view().into(), None)
                .map_err(|e| PipelineError::InferenceError(format!("orientation model: {:?}", e)))?;
            let logits: NdTensor<f32, 2> = output.try_into().map_err(|e| {
                PipelineError::InferenceError(format!("orientation output: {:?}", e))
            })?;

            let scores: Vec<f32> = logits.iter().copied().collect();
            let class = arg_max(&scores).ok_or_else(|| {
                PipelineError::InferenceError("orientation model returned no scores".to_string())
            })?;

            Orientation::from_class(class).ok_or_else(|| {
                PipelineError::InferenceError(format!("unexpected orientation class {}", class))
            })
        }
    }
}

/// Orientation stage wrapping whichever model was selected at construction
#[derive(Clone)]
pub struct OrientationClassifier {
    model: Arc<dyn OrientationModel>,
}

impl OrientationClassifier {
    pub fn new(model: Arc<dyn OrientationModel>) -> Self {
        Self { model }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_available()
    }

    pub fn classify(&self, image: &GrayImage) -> Result<Orientation, PipelineError> {
        let orientation = self.model.predict(image)?;
        tracing::debug!(
            "Orientation model '{}' predicted {} degrees",
            self.model.name(),
            orientation.degrees()
        );
        Ok(orientation)
    }
}

impl Default for OrientationClassifier {
    fn default() -> Self {
        Self::new(Arc::new(IdentityOrientation))
    }
}
