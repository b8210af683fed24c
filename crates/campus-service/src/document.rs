//! Uploaded documents and who may see them.

use diesel_async::AsyncPgConnection;
use sha2::{Digest, Sha256};

use campus_core::config::DocumentsConfig;
use campus_db::db::enums::Role;
use campus_db::db::query::course::{self as course_query, CourseFilter};
use campus_db::db::query::document::{self as document_query, DocumentScope};
use campus_db::db::query::student as student_query;
use campus_db::model::document::{DocumentContent, DocumentMeta, NewDocument};
use campus_db::model::user::User;

use crate::error::{ServiceError, ServiceResult};
use crate::notification::notify_users;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from a client, already read into memory.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub course_id: Option<uuid::Uuid>,
    pub content: Vec<u8>,
}

/// ## Summary
/// Keeps only the last path component of a client-supplied file name.
#[must_use]
pub fn sanitize_file_name(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        "document".to_string()
    } else {
        name.to_string()
    }
}

#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// ## Summary
/// Rejects empty uploads and uploads over the configured limit.
///
/// ## Errors
/// `ValidationError` when empty, `PayloadTooLarge` when over the limit.
pub fn check_size(config: &DocumentsConfig, len: usize) -> ServiceResult<()> {
    if len == 0 {
        return Err(ServiceError::ValidationError(
            "Le fichier est vide".to_string(),
        ));
    }
    let len = u64::try_from(len).unwrap_or(u64::MAX);
    if len > config.max_upload_bytes {
        return Err(ServiceError::PayloadTooLarge(format!(
            "Le fichier dépasse la taille maximale de {} octets",
            config.max_upload_bytes
        )));
    }
    Ok(())
}

/// ## Summary
/// Whether a document is visible given the actor's reachable courses.
#[must_use]
pub fn is_visible(actor: &User, document: &DocumentMeta, course_ids: &[uuid::Uuid]) -> bool {
    actor.is_admin()
        || document.owner_id == actor.id
        || document
            .course_id
            .is_some_and(|course_id| course_ids.contains(&course_id))
}

/// Courses whose documents `actor` may read: the ones they teach, and for
/// students the ones of their formation.
async fn reachable_courses(
    conn: &mut AsyncPgConnection,
    actor: &User,
) -> ServiceResult<Vec<uuid::Uuid>> {
    let filter = match actor.role {
        Role::Admin => return Ok(Vec::new()),
        Role::Teacher => CourseFilter {
            teacher_id: Some(actor.id),
            ..CourseFilter::default()
        },
        Role::Student => match student_query::formation_of(conn, actor.id).await? {
            Some(formation_id) => CourseFilter {
                formation_id: Some(formation_id),
                ..CourseFilter::default()
            },
            None => return Ok(Vec::new()),
        },
    };
    let courses = course_query::list_courses(conn, filter).await?;
    Ok(courses.into_iter().map(|course| course.id).collect())
}

async fn scope_for(conn: &mut AsyncPgConnection, actor: &User) -> ServiceResult<DocumentScope> {
    if actor.is_admin() {
        return Ok(DocumentScope::All);
    }
    Ok(DocumentScope::Visible {
        owner_id: actor.id,
        course_ids: reachable_courses(conn, actor).await?,
    })
}

/// ## Errors
/// Returns a database error if a query fails.
pub async fn list(
    conn: &mut AsyncPgConnection,
    actor: &User,
    course_id: Option<uuid::Uuid>,
) -> ServiceResult<Vec<DocumentMeta>> {
    let scope = scope_for(conn, actor).await?;
    Ok(document_query::list_documents(conn, scope, course_id).await?)
}

/// ## Errors
/// Returns `NotFound` if the document does not exist or is not visible to
/// `actor`.
pub async fn get(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<DocumentMeta> {
    let document = document_query::get_document(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("document {id}")))?;
    let course_ids = reachable_courses(conn, actor).await?;
    if !is_visible(actor, &document, &course_ids) {
        return Err(ServiceError::NotFound(format!("document {id}")));
    }
    Ok(document)
}

/// ## Errors
/// Same as [`get`].
pub async fn download(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<DocumentContent> {
    get(conn, actor, id).await?;
    document_query::get_content(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("document {id}")))
}

/// ## Summary
/// Stores an upload. Attaching it to a course requires that course to be
/// reachable by the uploader (admins may use any course).
///
/// ## Side Effects
/// Notifies the students of the course's formation. A failed notification
/// is logged and does not fail the upload.
///
/// ## Errors
/// - `ValidationError` for an empty file or an unknown course.
/// - `PayloadTooLarge` over `documents.max_upload_bytes`.
/// - `AuthorizationError` for a course the uploader cannot reach.
#[tracing::instrument(
    skip(conn, config, actor, upload),
    fields(actor_id = %actor.id, size = upload.content.len())
)]
pub async fn upload(
    conn: &mut AsyncPgConnection,
    config: &DocumentsConfig,
    actor: &User,
    upload: Upload,
) -> ServiceResult<DocumentMeta> {
    check_size(config, upload.content.len())?;
    let size_bytes = i64::try_from(upload.content.len())
        .map_err(|_| ServiceError::PayloadTooLarge("Fichier trop volumineux".to_string()))?;

    let course = match upload.course_id {
        Some(course_id) => {
            let course = course_query::get_course(conn, course_id)
                .await?
                .ok_or_else(|| ServiceError::ValidationError("Cours introuvable".to_string()))?;
            if !actor.is_admin() && !reachable_courses(conn, actor).await?.contains(&course_id) {
                return Err(ServiceError::AuthorizationError(
                    "Access denied: upload to a course outside your reach".to_string(),
                ));
            }
            Some(course)
        }
        None => None,
    };

    let file_name = sanitize_file_name(&upload.file_name);
    let content_type = upload
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let digest = sha256_hex(&upload.content);

    let document = document_query::insert_document(
        conn,
        &NewDocument {
            id: uuid::Uuid::now_v7(),
            owner_id: actor.id,
            course_id: upload.course_id,
            file_name: &file_name,
            content_type,
            size_bytes,
            sha256: &digest,
            content: &upload.content,
        },
    )
    .await?;
    tracing::info!(document_id = %document.id, "Document stored");

    if let Some(course) = course {
        let notified = async {
            let recipients: Vec<uuid::Uuid> =
                student_query::ids_in_formation(conn, course.formation_id)
                    .await?
                    .into_iter()
                    .filter(|id| *id != actor.id)
                    .collect();
            notify_users(
                conn,
                &recipients,
                "Nouveau document",
                &format!("{} a été ajouté au cours {}", document.file_name, course.title),
                Some(&format!("/documents/{}", document.id)),
            )
            .await
        }
        .await;
        if let Err(e) = notified {
            tracing::warn!(error = %e, "Document stored but students were not notified");
        }
    }

    Ok(document)
}

/// ## Errors
/// - `NotFound` if the document does not exist or is not visible.
/// - `AuthorizationError` unless `actor` owns it or is an admin.
#[tracing::instrument(skip(conn, actor), fields(actor_id = %actor.id))]
pub async fn delete(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<()> {
    let document = get(conn, actor, id).await?;
    if !actor.is_admin() && document.owner_id != actor.id {
        return Err(ServiceError::AuthorizationError(
            "Access denied: only the owner may delete a document".to_string(),
        ));
    }
    document_query::delete_document(conn, id).await?;
    tracing::info!(document_id = %id, "Document deleted");
    Ok(())
}
