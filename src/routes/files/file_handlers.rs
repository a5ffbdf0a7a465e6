use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use log::{info, warn};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::file_models::{FileDeleteResponse, UploadName, DEFAULT_MIME_TYPE, FILE_FIELD};
use crate::access::task_with_role;
use crate::auth::CurrentUser;
use crate::config::Config;
use crate::errors::{ApiError, ApiResult};
use crate::models::file_attachment::{FileAttachment, NewAttachment};
use crate::models::project_member::ProjectRole;
use crate::routes::tasks::task_handlers::remove_blobs;
use crate::storage::{Storage, StorageError};

fn multipart_error(err: actix_multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Malformed upload: {}", err))
}

/// Reads a field into memory, failing once it grows past `limit` bytes.
async fn read_limited(field: &mut Field, limit: usize) -> ApiResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

pub async fn list_files(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let files: Vec<_> = FileAttachment::list_for_task(pool.get_ref(), task.id)
        .await?
        .iter()
        .map(FileAttachment::view)
        .collect();
    Ok(HttpResponse::Ok().json(files))
}

pub async fn upload_file(
    pool: web::Data<SqlitePool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Member).await?;

    let mut upload = None;
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.content_disposition().get_name() != Some(FILE_FIELD) {
            // Drain fields we do not use so the stream can advance
            while field.try_next().await.map_err(multipart_error)?.is_some() {}
            continue;
        }
        let name = UploadName::parse(field.content_disposition().get_filename())?;
        let mime_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let bytes = read_limited(&mut field, config.max_content_length).await?;
        upload = Some((name, mime_type, bytes));
        break;
    }
    let (name, mime_type, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file part in the request".into()))?;

    let stored_name = name.stored_name(Uuid::new_v4());
    let backend = storage.active();
    backend.put(&stored_name, &bytes, &mime_type).await?;

    let inserted = FileAttachment::insert(
        pool.get_ref(),
        &NewAttachment {
            task_id: task.id,
            filename: &stored_name,
            original_filename: &name.original_filename,
            storage_key: &stored_name,
            file_size: bytes.len() as i64,
            mime_type: &mime_type,
            storage_type: backend.storage_type(),
            uploaded_by_id: current.id(),
        },
    )
    .await;
    let attachment_id = match inserted {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = backend.delete(&stored_name).await {
                warn!("Failed to remove orphaned blob {}: {}", stored_name, cleanup);
            }
            return Err(e.into());
        }
    };

    let attachment = FileAttachment::find(pool.get_ref(), attachment_id)
        .await?
        .ok_or(ApiError::NotFound("File"))?;
    info!(
        "User {} attached {} to {} ({} backend)",
        current.user.username,
        attachment.original_filename,
        task.task_key(),
        attachment.storage_type
    );
    Ok(HttpResponse::Created().json(attachment.view()))
}

pub async fn download_file(
    pool: web::Data<SqlitePool>,
    storage: web::Data<Storage>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let attachment = FileAttachment::find(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("File"))?;
    task_with_role(pool.get_ref(), attachment.task_id, &current, ProjectRole::Viewer).await?;

    let bytes = match storage
        .backend(attachment.storage_type)?
        .get(&attachment.storage_key)
        .await
    {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound(key)) => {
            warn!("Attachment {} has no blob under {}", attachment.id, key);
            return Err(ApiError::NotFound("File"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok()
        .content_type(attachment.mime_type.as_str())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(attachment.original_filename.clone())],
        })
        .body(bytes))
}

pub async fn delete_file(
    pool: web::Data<SqlitePool>,
    storage: web::Data<Storage>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let attachment = FileAttachment::find(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("File"))?;
    task_with_role(pool.get_ref(), attachment.task_id, &current, ProjectRole::Admin).await?;

    FileAttachment::delete(pool.get_ref(), attachment.id).await?;
    remove_blobs(&storage, std::slice::from_ref(&attachment)).await;

    info!("User {} deleted file {}", current.user.username, attachment.original_filename);
    Ok(HttpResponse::Ok().json(FileDeleteResponse {
        success: true,
        message: "File deleted successfully".into(),
    }))
}
