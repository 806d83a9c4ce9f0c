use crate::classify::DocumentType;
use crate::error::PipelineError;
use image::GrayImage;
use serde::Serialize;
use std::time::Instant;

use super::steps;
use super::steps::sharpen::Unsharp;

/// Fixed binarization level of the tabular profile
const TABULAR_THRESHOLD: u8 = 128;

/// Category-specific filter chains applied before OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementProfile {
    /// Technical reports and geological surveys
    /// Steps: strong sharpen, normalize, brighten 10%
    Detailed,
    /// Assay results and drilling logs
    /// Steps: moderate sharpen, fixed threshold at 128
    Tabular,
    /// Compliance forms
    /// Steps: light sharpen, normalize
    Form,
    /// Everything else
    /// Steps: Laplacian sharpen, normalize
    General,
}

impl EnhancementProfile {
    pub fn for_document(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::TechnicalReport | DocumentType::GeologicalSurvey => Self::Detailed,
            DocumentType::AssayResults | DocumentType::DrillingLogs => Self::Tabular,
            DocumentType::ComplianceForm => Self::Form,
            DocumentType::ResourceEstimate | DocumentType::GeneralDocument => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Tabular => "tabular",
            Self::Form => "form",
            Self::General => "general",
        }
    }
}

/// Timing information for a single enhancement step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Enhanced image with timing stats
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementResult {
    #[serde(skip)]
    pub image: GrayImage,
    pub total_time_ms: u64,
    pub profile: EnhancementProfile,
    pub steps: Vec<StepTiming>,
}

/// Adaptive enhancer running the chain selected by the document type
pub struct Enhancer {
    profile: EnhancementProfile,
}

impl Enhancer {
    pub fn new(profile: EnhancementProfile) -> Self {
        Self { profile }
    }

    pub fn for_document(document_type: DocumentType) -> Self {
        Self::new(EnhancementProfile::for_document(document_type))
    }

    /// Run the profile's filter chain
    pub fn process(&self, image: GrayImage) -> Result<EnhancementResult, PipelineError> {
        let start = Instant::now();
        let mut timings = Vec::new();

        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::EnhancementError(format!(
                "cannot enhance a {}x{} image",
                image.width(),
                image.height()
            )));
        }

        let mut img = image;

        img = match self.profile {
            EnhancementProfile::Detailed => self.run_step("sharpen", img, &mut timings, |i| {
                steps::sharpen::unsharp(
                    i,
                    Unsharp {
                        sigma: 2.0,
                        amount: 1.0,
                    },
                )
            }),
            EnhancementProfile::Tabular => self.run_step("sharpen", img, &mut timings, |i| {
                steps::sharpen::unsharp(
                    i,
                    Unsharp {
                        sigma: 1.5,
                        amount: 0.5,
                    },
                )
            }),
            EnhancementProfile::Form => self.run_step("sharpen", img, &mut timings, |i| {
                steps::sharpen::unsharp(
                    i,
                    Unsharp {
                        sigma: 1.0,
                        amount: 0.5,
                    },
                )
            }),
            EnhancementProfile::General => {
                self.run_step("sharpen", img, &mut timings, steps::sharpen::laplacian)
            }
        };

        // Tabular pages are binarized instead of stretched
        if self.profile == EnhancementProfile::Tabular {
            img = self.run_step("threshold", img, &mut timings, |i| {
                steps::threshold::fixed(&i, TABULAR_THRESHOLD)
            });
        } else {
            img = self.run_step("normalize", img, &mut timings, steps::normalize::apply);
        }

        if self.profile == EnhancementProfile::Detailed {
            img = self.run_step("brighten", img, &mut timings, |i| {
                steps::contrast::brighten(i, steps::contrast::BRIGHTEN_FACTOR)
            });
        }

        tracing::debug!(
            "Enhanced page with {} profile in {}ms",
            self.profile.as_str(),
            start.elapsed().as_millis()
        );

        Ok(EnhancementResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            profile: self.profile,
            steps: timings,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: GrayImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> GrayImage
    where
        F: FnOnce(GrayImage) -> GrayImage,
    {
        let step_start = Instant::now();
        let result = step_fn(img);
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn sample_page() -> GrayImage {
        GrayImage::from_fn(60, 40, |x, y| {
            if (10..50).contains(&x) && y % 8 < 2 {
                Luma([40])
            } else {
                Luma([180])
            }
        })
    }

    fn step_names(result: &EnhancementResult) -> Vec<&str> {
        result.steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_profiles_follow_document_type() {
        use DocumentType::*;
        assert_eq!(
            EnhancementProfile::for_document(TechnicalReport),
            EnhancementProfile::Detailed
        );
        assert_eq!(
            EnhancementProfile::for_document(GeologicalSurvey),
            EnhancementProfile::Detailed
        );
        assert_eq!(
            EnhancementProfile::for_document(DrillingLogs),
            EnhancementProfile::Tabular
        );
        assert_eq!(
            EnhancementProfile::for_document(ComplianceForm),
            EnhancementProfile::Form
        );
        assert_eq!(
            EnhancementProfile::for_document(ResourceEstimate),
            EnhancementProfile::General
        );
    }

    #[test]
    fn test_tabular_profile_binarizes() {
        let result = Enhancer::for_document(DocumentType::AssayResults)
            .process(sample_page())
            .unwrap();

        assert_eq!(step_names(&result), vec!["sharpen", "threshold"]);
        assert!(result.image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_detailed_profile_runs_three_steps() {
        let result = Enhancer::for_document(DocumentType::TechnicalReport)
            .process(sample_page())
            .unwrap();

        assert_eq!(step_names(&result), vec!["sharpen", "normalize", "brighten"]);
        assert_eq!(result.image.dimensions(), (60, 40));
    }

    #[test]
    fn test_general_profile_stretches_range() {
        let result = Enhancer::new(EnhancementProfile::General)
            .process(sample_page())
            .unwrap();

        assert_eq!(step_names(&result), vec!["sharpen", "normalize"]);
        let bounds = steps::normalize::intensity_bounds(&result.image);
        assert_eq!(bounds, Some((0, 255)));
    }

    #[test]
    fn test_empty_image_is_an_enhancement_error() {
        let err = Enhancer::new(EnhancementProfile::Form)
            .process(GrayImage::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EnhancementError(_)));
    }
}
