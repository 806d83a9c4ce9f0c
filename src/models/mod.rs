//! Trained model capabilities and their fallbacks
//!
//! Each model is a trait with a trained (rten) variant and a null variant.
//! The variant is chosen once when the [`ModelSet`] is built; stages never
//! branch on which one is active.

pub mod layout;
pub mod orientation;
pub mod store;

pub use layout::{Detection, LayoutDetector, LayoutModel, NullLayoutModel};
pub use orientation::{IdentityOrientation, Orientation, OrientationClassifier, OrientationModel};

use crate::config::PipelineConfig;
use image::GrayImage;
use std::sync::Arc;

/// File name of the orientation classifier inside the model directory
pub const ORIENTATION_MODEL_FILE: &str = "orientation.rten";
/// File name of the layout detector inside the model directory
pub const LAYOUT_MODEL_FILE: &str = "layout.rten";

/// Read-only model handles shared by every pipeline invocation
#[derive(Clone)]
pub struct ModelSet {
    pub orientation: Arc<dyn OrientationModel>,
    pub layout: Arc<dyn LayoutModel>,
}

impl ModelSet {
    /// Identity orientation and no layout detection
    pub fn fallback() -> Self {
        Self {
            orientation: Arc::new(IdentityOrientation),
            layout: Arc::new(NullLayoutModel),
        }
    }

    /// Load trained models from the configured directory
    ///
    /// A model that cannot be found or loaded is replaced by its fallback;
    /// this never fails.
    pub fn load(config: &PipelineConfig) -> Self {
        if config.enable_gpu {
            tracing::warn!("GPU inference requested but only the CPU backend is available");
        }

        let set = Self {
            orientation: load_orientation(config),
            layout: load_layout(config),
        };

        tracing::info!(
            "Models ready (orientation: {}, layout: {})",
            set.orientation.name(),
            set.layout.name()
        );
        set
    }
}

#[cfg(feature = "rten-models")]
fn load_orientation(config: &PipelineConfig) -> Arc<dyn OrientationModel> {
    let dir = config.resolved_model_dir();
    let loaded = store::ensure_model(&dir, ORIENTATION_MODEL_FILE, config.model_base_url.as_deref())
        .and_then(|path| orientation::RtenOrientationModel::load(&path));

    match loaded {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::warn!("Orientation model unavailable, using identity: {}", e);
            Arc::new(IdentityOrientation)
        }
    }
}

#[cfg(feature = "rten-models")]
fn load_layout(config: &PipelineConfig) -> Arc<dyn LayoutModel> {
    let dir = config.resolved_model_dir();
    let loaded = store::ensure_model(&dir, LAYOUT_MODEL_FILE, config.model_base_url.as_deref())
        .and_then(|path| layout::RtenLayoutModel::load(&path));

    match loaded {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::warn!("Layout model unavailable, regions will be empty: {}", e);
            Arc::new(NullLayoutModel)
        }
    }
}

#[cfg(not(feature = "rten-models"))]
fn load_orientation(_config: &PipelineConfig) -> Arc<dyn OrientationModel> {
    tracing::warn!("Built without rten-models; orientation is fixed at 0 degrees");
    Arc::new(IdentityOrientation)
}

#[cfg(not(feature = "rten-models"))]
fn load_layout(_config: &PipelineConfig) -> Arc<dyn LayoutModel> {
    tracing::warn!("Built without rten-models; layout detection is disabled");
    Arc::new(NullLayoutModel)
}

/// Resize to a `side`x`side` square and lay out as a `[3, side, side]`
/// planar buffer in `[0, 1]`, the grey channel repeated three times
pub fn to_nchw(gray: &GrayImage, side: u32) -> Vec<f32> {
    let resized = crate::preprocessing::steps::resize::to_square(gray, side);
    let plane: Vec<f32> = resized.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

    let mut data = Vec::with_capacity(plane.len() * 3);
    for _ in 0..3 {
        data.extend_from_slice(&plane);
    }
    data
}
