//! Clinical record endpoints: form schemas and creation.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, NoticedError};
use crate::api::types::{request_locale, ApiContext, Viewer};
use crate::content::{self, Message, Notice};
use crate::models::RecordKind;
use crate::records::{self, ClinicalRecord, FormFields, RecordDraft, RecordSchema};
use crate::storage::Attachment;

/// A file sent inline as a data URL (`data:<mime>;base64,<payload>`) or as
/// bare base64.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub data: String,
}

impl UploadBody {
    fn into_attachment(self) -> Result<Attachment, String> {
        let (declared, bytes) = decode_data_url(&self.data)?;
        Ok(Attachment {
            filename: self.filename,
            content_type: self.content_type.or(declared),
            bytes,
        })
    }
}

/// Decode a data URL or bare base64 payload, returning the MIME type the
/// data URL declared.
pub(crate) fn decode_data_url(data_url: &str) -> Result<(Option<String>, Vec<u8>), String> {
    let (mime, base64_data) = match data_url.find(',') {
        Some(idx) => {
            let header = &data_url[..idx];
            let mime = header
                .strip_prefix("data:")
                .and_then(|h| h.split(';').next())
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            (mime, &data_url[idx + 1..])
        }
        None => (None, data_url),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64_data.trim())
        .map_err(|e| format!("Base64 decode failed: {e}"))?;
    Ok((mime, bytes))
}

/// `GET /api/records/schema/:kind`
pub async fn schema(Path(kind): Path<RecordKind>) -> Json<RecordSchema> {
    Json(records::schema(kind))
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub kind: RecordKind,
    #[serde(default)]
    pub fields: FormFields,
    #[serde(default)]
    pub attachment: Option<UploadBody>,
}

#[derive(Serialize)]
pub struct CreatedRecord {
    #[serde(flatten)]
    pub record: ClinicalRecord,
    pub notice: Notice,
}

/// `POST /api/records`: validate, upload the optional file, insert.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Json(request): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<CreatedRecord>), NoticedError> {
    let locale = request_locale(&headers);
    let kind = request.kind;
    let today = chrono::Local::now().date_naive();

    let draft = RecordDraft::from_form(kind, &request.fields, today).map_err(|e| {
        let notice = content::notice_with(locale, Message::RecordFailed(kind), e.to_string());
        ApiError::from(e).with_notice(notice)
    })?;

    let attachment = request
        .attachment
        .map(UploadBody::into_attachment)
        .transpose()
        .map_err(|detail| {
            let notice = content::notice_with(locale, Message::RecordFailed(kind), detail.clone());
            ApiError::BadRequest(detail).with_notice(notice)
        })?;

    let record = records::create_clinical_record(&ctx.backend, &viewer.user_id, draft, attachment)
        .map_err(|e| {
            let notice = e.notice(kind, locale);
            ApiError::from(e).with_notice(notice)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRecord {
            record,
            notice: content::notice(locale, Message::RecordAdded(kind)),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_yields_declared_mime() {
        let (mime, bytes) = decode_data_url("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(mime.as_deref(), Some("image/jpeg"));
        assert_eq!(bytes[0], 0xFF);
    }

    #[test]
    fn bare_base64_has_no_mime() {
        let raw = base64::engine::general_purpose::STANDARD.encode(b"hello");
        let (mime, bytes) = decode_data_url(&raw).unwrap();
        assert_eq!(mime, None);
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn invalid_base64_rejected() {
        assert!(decode_data_url("not-valid-base64!!!").is_err());
    }

    #[test]
    fn explicit_content_type_wins_over_data_url() {
        let upload = UploadBody {
            filename: "scan.pdf".into(),
            content_type: Some("application/pdf".into()),
            data: "data:image/png;base64,aGVsbG8=".into(),
        };
        let attachment = upload.into_attachment().unwrap();
        assert_eq!(attachment.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(attachment.bytes, b"hello");
    }
}
