//! Document upload, listing and download.

use salvo::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use salvo::http::{HeaderValue, StatusCode};
use salvo::writing::{Json, Scribe};
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;

use super::extract::{authorize, path_id};
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};
use campus_db::model::document::{DocumentContent, DocumentMeta};
use campus_service::auth::{Action, Resource};
use campus_service::document::{self, Upload};
use campus_service::error::ServiceError;

/// Room left for multipart boundaries and form fields around the file.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
struct DocumentQuery {
    course_id: Option<uuid::Uuid>,
}

/// Stored bytes sent back as a download.
pub struct Attachment(pub DocumentContent);

impl Scribe for Attachment {
    fn render(self, res: &mut Response) {
        let DocumentContent {
            file_name,
            content_type,
            content,
        } = self.0;
        let content_type = HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        res.headers_mut().insert(CONTENT_TYPE, content_type);
        if let Ok(disposition) = HeaderValue::from_str(&content_disposition(&file_name)) {
            res.headers_mut().insert(CONTENT_DISPOSITION, disposition);
        }
        res.body(content);
    }
}

/// ## Summary
/// `attachment` disposition with an ASCII fallback name and the exact name
/// percent-encoded as RFC 5987 `filename*`.
#[must_use]
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn declared_length(req: &Request) -> Option<u64> {
    req.headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

fn too_large(limit: u64) -> AppError {
    ServiceError::PayloadTooLarge(format!(
        "Le fichier dépasse la taille maximale de {limit} octets"
    ))
    .into()
}

#[handler]
async fn list_documents(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<DocumentMeta>>> {
    let actor = authorize(depot, Resource::Documents, Action::Read)?;
    let query: DocumentQuery = req.parse_queries()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        document::list(&mut conn, &actor.user, query.course_id).await?,
    ))
}

/// ## Summary
/// POST /api/documents, multipart with a `file` part and an optional
/// `course_id` field.
///
/// ## Errors
/// 413 over `documents.max_upload_bytes`, 400 for an empty or missing file.
#[handler]
async fn upload_document(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<DocumentMeta>> {
    let actor = authorize(depot, Resource::Documents, Action::Write)?;
    let settings = get_config_from_depot(depot)?;
    let limit = settings.documents.max_upload_bytes;

    if declared_length(req).is_some_and(|len| len > limit.saturating_add(MULTIPART_OVERHEAD)) {
        return Err(too_large(limit));
    }

    let form = req.form_data().await?;
    let course_id = match form.fields.get("course_id").map(|raw| raw.trim()) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<uuid::Uuid>()
                .map_err(|_e| AppError::BadRequest("course_id invalide".to_string()))?,
        ),
        Some(_) | None => None,
    };

    let part = form
        .files
        .get("file")
        .ok_or_else(|| AppError::BadRequest("Aucun fichier reçu".to_string()))?;
    // Chunked bodies carry no length, so the spooled part is measured here.
    document::check_size(
        &settings.documents,
        usize::try_from(part.size()).unwrap_or(usize::MAX),
    )?;
    let upload = Upload {
        file_name: part.name().unwrap_or_default().to_string(),
        content_type: part.content_type().map(|mime| mime.to_string()),
        course_id,
        content: tokio::fs::read(part.path()).await?,
    };

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;
    let stored = document::upload(&mut conn, &settings.documents, &actor.user, upload).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(stored))
}

#[handler]
async fn get_document(req: &mut Request, depot: &mut Depot) -> AppResult<Json<DocumentMeta>> {
    let actor = authorize(depot, Resource::Documents, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(document::get(&mut conn, &actor.user, id).await?))
}

#[handler]
async fn download_document(req: &mut Request, depot: &mut Depot) -> AppResult<Attachment> {
    let actor = authorize(depot, Resource::Documents, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Attachment(
        document::download(&mut conn, &actor.user, id).await?,
    ))
}

#[handler]
async fn delete_document(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let actor = authorize(depot, Resource::Documents, Action::Delete)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    document::delete(&mut conn, &actor.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("documents")
        .get(list_documents)
        .post(upload_document)
        .push(
            Router::with_path("{id}")
                .get(get_document)
                .delete(delete_document)
                .push(Router::with_path("download").get(download_document)),
        )
}
