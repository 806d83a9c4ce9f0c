//! Page normalization and pre-OCR enhancement
//!
//! The normalizer prepares pages for model inference; the enhancer applies a
//! document-type specific filter chain before text recognition.

pub mod enhancer;
pub mod normalizer;
pub mod steps;

pub use enhancer::{EnhancementProfile, EnhancementResult, Enhancer, StepTiming};
pub use normalizer::{NormalizedPage, Normalizer};
