//! Rule-based document type classification from the layout region list

use crate::region::{LayoutRegion, RegionType};
use serde::{Deserialize, Serialize};

/// Document categories recognised by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    TechnicalReport,
    GeologicalSurvey,
    AssayResults,
    DrillingLogs,
    ResourceEstimate,
    ComplianceForm,
    GeneralDocument,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TechnicalReport => "technical-report",
            Self::GeologicalSurvey => "geological-survey",
            Self::AssayResults => "assay-results",
            Self::DrillingLogs => "drilling-logs",
            Self::ResourceEstimate => "resource-estimate",
            Self::ComplianceForm => "compliance-form",
            Self::GeneralDocument => "general-document",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub confidence: f32,
}

/// Classify a page from its layout regions
///
/// Rules are checked in priority order; the last one matches everything.
pub fn classify(regions: &[LayoutRegion]) -> Classification {
    let table_count = regions
        .iter()
        .filter(|r| r.region_type == RegionType::Table)
        .count();
    let has_table = table_count > 0;
    let has_chart = regions.iter().any(|r| r.region_type == RegionType::Chart);

    let (document_type, confidence) = if table_count >= 3 && has_chart {
        (DocumentType::TechnicalReport, 0.85)
    } else if table_count >= 2 && regions.len() > 5 {
        (DocumentType::AssayResults, 0.80)
    } else if has_table && has_chart {
        (DocumentType::ResourceEstimate, 0.75)
    } else if table_count == 1 && regions.len() <= 3 {
        (DocumentType::ComplianceForm, 0.70)
    } else {
        (DocumentType::GeneralDocument, 0.60)
    };

    Classification {
        document_type,
        confidence,
    }
}
