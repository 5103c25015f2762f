//! PDF downloads: the structured medical history report and bitmap export.

use std::str::FromStr;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::{ApiError, NoticedError};
use crate::api::types::{request_locale, ApiContext, Viewer};
use crate::content::{self, Locale, Message};
use crate::dashboard;
use crate::models::ReportSection;
use crate::report::{self, ReportError};

use super::records::decode_data_url;

/// `Content-Disposition` for a download. Characters that would end the
/// quoted filename early are dropped.
fn attachment_disposition(filename: &str) -> HeaderValue {
    let quoted: String = filename
        .chars()
        .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{quoted}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    let disposition = attachment_disposition(filename);
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

fn export_failure(err: ReportError, locale: Locale) -> NoticedError {
    let notice = content::notice(locale, Message::ExportFailed);
    ApiError::from(err).with_notice(notice)
}

/// Comma-separated section names; blank means every section.
fn parse_sections(raw: Option<&str>) -> Result<Vec<ReportSection>, ApiError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(ReportSection::all().to_vec());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ReportSection::from_str(s).map_err(|_| ApiError::BadRequest(format!("Unknown report section: {s}"))))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub sections: Option<String>,
    #[serde(default)]
    pub professional_name: Option<String>,
}

/// `GET /api/export/pdf?sections=exams,vaccines&professional_name=`
pub async fn medical_history(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Result<Response, NoticedError> {
    let locale = request_locale(&headers);
    let loaded = dashboard::load_patient_dashboard(&ctx.backend, &viewer.user_id)
        .map_err(ApiError::from)?;

    let mut options = loaded.export_options();
    options.sections = parse_sections(query.sections.as_deref())?;
    if let Some(name) = query.professional_name.filter(|n| !n.trim().is_empty()) {
        options.professional_name = name.trim().to_string();
    }

    let today = chrono::Local::now().date_naive();
    let bytes = report::export_medical_history(&loaded.report_data(), &options, today)
        .map_err(|e| export_failure(e, locale))?;

    Ok(pdf_response(bytes, &report::report_filename(&options.patient_name, today)))
}

#[derive(Debug, Deserialize)]
pub struct RasterRequest {
    /// PNG or JPEG as a data URL or bare base64.
    pub image: String,
}

/// `POST /api/export/raster`: paginate an already-rendered page image.
pub async fn raster(
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Json(request): Json<RasterRequest>,
) -> Result<Response, NoticedError> {
    let locale = request_locale(&headers);
    let (_, image) = decode_data_url(&request.image).map_err(|detail| {
        ApiError::BadRequest(detail).with_notice(content::notice(locale, Message::ExportFailed))
    })?;

    let bytes = report::export_raster_to_pdf(&image).map_err(|e| export_failure(e, locale))?;

    let patient_name = viewer
        .profile
        .as_ref()
        .map(|p| p.full_name.as_str())
        .unwrap_or("Patient");
    let today = chrono::Local::now().date_naive();
    Ok(pdf_response(bytes, &report::report_filename(patient_name, today)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_drops_quotes_from_filename() {
        let value = attachment_disposition("Ana \"Nina\" Souza_Medical_History_2024-05-01.pdf");
        assert_eq!(
            value.to_str().unwrap(),
            "attachment; filename=\"Ana Nina Souza_Medical_History_2024-05-01.pdf\""
        );
    }

    #[test]
    fn disposition_keeps_plain_filename() {
        let value = attachment_disposition("Maria_Silva_Medical_History_2024-05-01.pdf");
        assert_eq!(
            value.to_str().unwrap(),
            "attachment; filename=\"Maria_Silva_Medical_History_2024-05-01.pdf\""
        );
    }

    #[test]
    fn blank_sections_mean_all() {
        assert_eq!(parse_sections(None).unwrap().len(), 4);
        assert_eq!(parse_sections(Some(" ")).unwrap().len(), 4);
    }

    #[test]
    fn sections_parsed_in_given_order() {
        assert_eq!(
            parse_sections(Some("vaccines, exams")).unwrap(),
            [ReportSection::Vaccines, ReportSection::Exams]
        );
    }

    #[test]
    fn unknown_section_rejected() {
        assert!(matches!(
            parse_sections(Some("exams,allergies")),
            Err(ApiError::BadRequest(_))
        ));
    }
}
