//! PDF export of a patient's medical history.
//!
//! `layout` computes pages, `render` draws them with printpdf, `raster`
//! paginates an already-rendered bitmap.

pub mod layout;
pub mod raster;
pub mod render;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::*;

pub use layout::{layout_report, ReportLayout};
pub use raster::{export_raster_to_pdf, slice_offsets};
pub use render::render_pdf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Image decode failed: {0}")]
    Image(String),
    #[error("Image has no pixels")]
    EmptyImage,
}

/// Everything a report can print.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MedicalData {
    pub exams: Vec<Exam>,
    pub vaccines: Vec<Vaccine>,
    pub medications: Vec<Medication>,
    pub history: Vec<MedicalHistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub sections: Vec<ReportSection>,
    pub patient_name: String,
    pub professional_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sections: ReportSection::all().to_vec(),
            patient_name: "Patient".into(),
            professional_name: "Healthcare Provider".into(),
        }
    }
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// `<name with whitespace runs as "_">_Medical_History_<YYYY-MM-DD>.pdf`
pub fn report_filename(patient_name: &str, date: NaiveDate) -> String {
    format!(
        "{}_Medical_History_{}.pdf",
        WHITESPACE_RUN.replace_all(patient_name, "_"),
        date.format("%Y-%m-%d")
    )
}

/// Lay out and render the structured report.
pub fn export_medical_history(
    data: &MedicalData,
    options: &ExportOptions,
    generated_on: NaiveDate,
) -> Result<Vec<u8>, ReportError> {
    let layout = layout_report(data, options, generated_on);
    let bytes = render_pdf(&layout)?;
    tracing::info!(
        pages = layout.page_count(),
        size = bytes.len(),
        "Medical history report rendered"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_replaces_whitespace_runs() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
        assert_eq!(
            report_filename("Maria  da\tSilva", date),
            "Maria_da_Silva_Medical_History_2024-12-20.pdf"
        );
        assert_eq!(report_filename("Patient", date), "Patient_Medical_History_2024-12-20.pdf");
    }

    #[test]
    fn default_options_select_all_sections() {
        let options = ExportOptions::default();
        assert_eq!(options.sections.len(), 4);
        assert_eq!(options.patient_name, "Patient");
        assert_eq!(options.professional_name, "Healthcare Provider");
    }

    #[test]
    fn partial_options_deserialize_with_defaults() {
        let options: ExportOptions =
            serde_json::from_str(r#"{"sections": ["vaccines"], "patient_name": "Maria Silva"}"#).unwrap();
        assert_eq!(options.sections, [ReportSection::Vaccines]);
        assert_eq!(options.professional_name, "Healthcare Provider");
    }

    #[test]
    fn export_produces_pdf_bytes() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
        let bytes = export_medical_history(&MedicalData::default(), &ExportOptions::default(), date).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
