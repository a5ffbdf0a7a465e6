use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

use crate::storage::StorageType;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip",
    "rar", "7z", "tar", "gz", "mp4", "avi", "mov", "mp3", "wav", "flac", "svg", "webp", "bmp",
    "tiff", "rtf", "odt",
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "odt"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];

#[derive(Debug, Clone, FromRow)]
pub struct FileAttachment {
    pub id: i64,
    pub task_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_type: StorageType,
    pub uploaded_by_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    pub id: i64,
    pub task_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub human_readable_size: String,
    pub mime_type: String,
    pub file_extension: String,
    pub is_image: bool,
    pub is_document: bool,
    pub is_archive: bool,
    pub storage_type: StorageType,
    pub uploaded_by_id: i64,
    pub created_at: DateTime<Utc>,
}

pub struct NewAttachment<'a> {
    pub task_id: i64,
    pub filename: &'a str,
    pub original_filename: &'a str,
    pub storage_key: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
    pub storage_type: StorageType,
    pub uploaded_by_id: i64,
}

/// Lower-cased extension without the dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn allowed_file(filename: &str) -> bool {
    let ext = extension_of(filename);
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

/// Reduces a client-supplied name to a plain ASCII file name: path
/// components are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9._-]` is removed, and leading dots or underscores are stripped.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

pub fn human_readable_size(bytes: i64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}

impl FileAttachment {
    pub fn view(&self) -> AttachmentView {
        let ext = extension_of(&self.original_filename);
        AttachmentView {
            id: self.id,
            task_id: self.task_id,
            filename: self.filename.clone(),
            original_filename: self.original_filename.clone(),
            file_size: self.file_size,
            human_readable_size: human_readable_size(self.file_size),
            mime_type: self.mime_type.clone(),
            is_image: IMAGE_EXTENSIONS.contains(&ext.as_str()),
            is_document: DOCUMENT_EXTENSIONS.contains(&ext.as_str()),
            is_archive: ARCHIVE_EXTENSIONS.contains(&ext.as_str()),
            file_extension: if ext.is_empty() { ext } else { format!(".{}", ext) },
            storage_type: self.storage_type,
            uploaded_by_id: self.uploaded_by_id,
            created_at: self.created_at,
        }
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<FileAttachment>, sqlx::Error> {
        sqlx::query_as::<_, FileAttachment>("SELECT * FROM file_attachments WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_task<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: i64,
    ) -> Result<Vec<FileAttachment>, sqlx::Error> {
        sqlx::query_as::<_, FileAttachment>(
            "SELECT * FROM file_attachments WHERE task_id = ? ORDER BY created_at, id",
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_for_project<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Vec<FileAttachment>, sqlx::Error> {
        sqlx::query_as::<_, FileAttachment>(
            "SELECT f.* FROM file_attachments f
             JOIN tasks t ON t.id = f.task_id
             WHERE t.project_id = ?",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        new_attachment: &NewAttachment<'_>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO file_attachments (task_id, filename, original_filename, storage_key, file_size,
                                           mime_type, storage_type, uploaded_by_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_attachment.task_id)
        .bind(new_attachment.filename)
        .bind(new_attachment.original_filename)
        .bind(new_attachment.storage_key)
        .bind(new_attachment.file_size)
        .bind(new_attachment.mime_type)
        .bind(new_attachment.storage_type)
        .bind(new_attachment.uploaded_by_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM file_attachments WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(allowed_file("Report.PDF"));
        assert!(allowed_file("archive.tar.gz"));
        assert!(!allowed_file("script.sh"));
        assert!(!allowed_file("README"));
    }

    #[test]
    fn secure_filename_strips_paths_and_odd_characters() {
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\My Notes.txt"), "My_Notes.txt");
        assert_eq!(secure_filename("..hidden.png"), "hidden.png");
        assert_eq!(secure_filename("rés umé?.pdf"), "rs_um.pdf");
        assert_eq!(secure_filename("???"), "");
    }

    #[test]
    fn sizes_are_humanised() {
        assert_eq!(human_readable_size(512), "512.0 B");
        assert_eq!(human_readable_size(2048), "2.0 KB");
        assert_eq!(human_readable_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn view_classifies_by_extension() {
        let attachment = FileAttachment {
            id: 1,
            task_id: 2,
            filename: "0f8c.png".into(),
            original_filename: "diagram.PNG".into(),
            storage_key: "0f8c.png".into(),
            file_size: 1536,
            mime_type: "image/png".into(),
            storage_type: StorageType::Local,
            uploaded_by_id: 3,
            created_at: Utc::now(),
        };
        let view = attachment.view();
        assert!(view.is_image);
        assert!(!view.is_document);
        assert!(!view.is_archive);
        assert_eq!(view.file_extension, ".png");
        assert_eq!(view.human_readable_size, "1.5 KB");
    }
}
