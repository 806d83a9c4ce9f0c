//! Individual image operations shared by the normalizer and the enhancer

pub mod contrast;
pub mod deskew;
pub mod grayscale;
pub mod normalize;
pub mod resize;
pub mod rotate;
pub mod sharpen;
pub mod threshold;
