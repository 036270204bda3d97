use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::application::access;
use crate::application::errors::ServiceError;
use crate::application::use_cases::evidence::download_evidence::DownloadEvidence;
use crate::application::use_cases::evidence::set_evidence_active::SetEvidenceActive;
use crate::application::use_cases::evidence::upload_evidence::{EvidenceUpload, UploadEvidence};
use crate::bootstrap::app_context::AppContext;
use crate::domain::users::Role;
use crate::presentation::http::auth::{CurrentUser, require};
use crate::presentation::http::error::PageError;
use crate::presentation::http::resource::parse_id;

// multipart framing and the description field
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn routes(ctx: AppContext) -> Router {
    let body_limit = ctx.cfg.upload_max_bytes + FORM_OVERHEAD_BYTES;
    Router::new()
        .route(
            "/indicators/:id/evidence",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/evidence/:id/download", get(download))
        .route("/evidence/:id/deactivate", post(deactivate))
        .route("/evidence/:id/activate", post(activate))
        .with_state(ctx)
}

pub async fn upload(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, PageError> {
    require(&user, Role::Planner)?;
    let indicator_id = parse_id(&id)?;

    let unreadable = |e: axum::extract::multipart::MultipartError| {
        tracing::warn!(error = %e, indicator_id = %indicator_id, "evidence_multipart_failed");
        PageError::BadRequest(
            "The upload could not be read. It may exceed the size limit.".into(),
        )
    };

    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut description: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(unreadable)?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            Some("description") => {
                let text = field.text().await.map_err(unreadable)?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    description = Some(trimmed.to_string());
                }
            }
            _ => {}
        }
    }
    let (original_filename, content_type, bytes) = file.unwrap_or_default();

    let indicators = ctx.records().indicators.clone();
    let evidence = ctx.evidence_repo();
    let store = ctx.evidence_store();
    let uc = UploadEvidence {
        indicators: indicators.as_ref(),
        evidence: evidence.as_ref(),
        store: store.as_ref(),
        max_bytes: ctx.cfg.upload_max_bytes,
    };
    let upload = EvidenceUpload {
        indicator_id,
        original_filename,
        content_type,
        description,
        bytes,
        uploaded_by: user.id,
    };
    match uc.execute(upload).await {
        Ok(_) => Ok(
            Redirect::to(&format!("/indicators/{}?notice=uploaded", indicator_id)).into_response(),
        ),
        Err(ServiceError::Validation(errors)) => {
            let message = errors
                .iter()
                .map(|(_, msg)| msg)
                .collect::<Vec<_>>()
                .join(" ");
            Err(PageError::BadRequest(message))
        }
        Err(e) => Err(e.into()),
    }
}

/// `Content-Disposition` with an ASCII fallback and the UTF-8 original name.
pub fn attachment_disposition(stored: &str, original: &str) -> String {
    let fallback: String = stored
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(original)
    )
}

pub async fn download(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let evidence = ctx.evidence_repo();
    let store = ctx.evidence_store();
    let (record, bytes) = DownloadEvidence {
        evidence: evidence.as_ref(),
        store: store.as_ref(),
    }
    .execute(id, access::can(&user, Role::Admin))
    .await?;

    let content_type = record
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&attachment_disposition(
        &record.filename,
        &record.original_filename,
    ))
    .unwrap_or(HeaderValue::from_static("attachment"));

    let mut resp = Response::new(Body::from(bytes));
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
    tracing::debug!(evidence_id = %id, user_id = %user.id, "evidence_downloaded");
    Ok(resp)
}

async fn set_active(
    ctx: &AppContext,
    user_id: uuid::Uuid,
    raw_id: &str,
    active: bool,
) -> Result<Response, PageError> {
    let id = parse_id(raw_id)?;
    let evidence = ctx.evidence_repo();
    let indicator_id = SetEvidenceActive {
        evidence: evidence.as_ref(),
    }
    .execute(id, active)
    .await?;
    tracing::debug!(evidence_id = %id, user_id = %user_id, active, "evidence_toggled");
    let notice = if active { "activated" } else { "deactivated" };
    Ok(Redirect::to(&format!("/indicators/{}?notice={}", indicator_id, notice)).into_response())
}

pub async fn deactivate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    require(&user, Role::Planner)?;
    set_active(&ctx, user.id, &id, false).await
}

pub async fn activate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    require(&user, Role::Planner)?;
    set_active(&ctx, user.id, &id, true).await
}
