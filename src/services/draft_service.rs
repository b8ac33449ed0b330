//! Draft persistence, including the attachment records of each draft.
//!
//! Attachments are stored as a JSON array inside the draft row. Updates to a
//! single attachment always write a full replacement of that record, matched
//! by client id.

use crate::error::AppError;
use crate::models::Draft;
use draft_attachments::{DraftStore, FileInfo, UploadError};
use rusqlite::Connection;

/// Loads the draft for a channel or thread, if one exists
pub fn load_draft(
    conn: &Connection,
    channel_id: &str,
    root_id: &str,
) -> Result<Option<Draft>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, channel_id, root_id, message, files, created_at, updated_at
         FROM drafts
         WHERE channel_id = ?1 AND root_id = ?2",
    )?;

    let result = stmt.query_row([channel_id, root_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    });

    match result {
        Ok((id, channel_id, root_id, message, files_json, created_at, updated_at)) => {
            let files: Vec<FileInfo> = serde_json::from_str(&files_json)?;
            Ok(Some(Draft {
                id,
                channel_id,
                root_id,
                message,
                files,
                created_at,
                updated_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// Saves or updates the draft for a channel or thread
pub fn save_draft(
    conn: &Connection,
    channel_id: &str,
    root_id: &str,
    message: &str,
    files: &[FileInfo],
) -> Result<i64, AppError> {
    let files_json = serde_json::to_string(files)?;

    let existing = load_draft(conn, channel_id, root_id)?;
    if let Some(existing) = existing {
        conn.execute(
            "UPDATE drafts SET message = ?1, files = ?2 WHERE id = ?3",
            (message, &files_json, existing.id),
        )?;
        Ok(existing.id)
    } else {
        conn.execute(
            "INSERT INTO drafts (channel_id, root_id, message, files) VALUES (?1, ?2, ?3, ?4)",
            (channel_id, root_id, message, &files_json),
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// Appends an attachment record to the draft, creating the draft if needed
pub fn add_draft_file(
    conn: &Connection,
    channel_id: &str,
    root_id: &str,
    file: &FileInfo,
) -> Result<(), AppError> {
    let draft = load_draft(conn, channel_id, root_id)?;
    let (message, mut files) = match draft {
        Some(d) => (d.message, d.files),
        None => (String::new(), Vec::new()),
    };
    files.push(file.clone());
    save_draft(conn, channel_id, root_id, &message, &files)?;
    Ok(())
}

/// Replaces the attachment record matching the file's client id
pub fn update_draft_file(
    conn: &Connection,
    channel_id: &str,
    root_id: &str,
    file: &FileInfo,
) -> Result<(), AppError> {
    let draft = load_draft(conn, channel_id, root_id)?
        .ok_or_else(|| AppError::NotFound(format!("Draft for channel {}", channel_id)))?;

    let mut files = draft.files;
    let slot = files
        .iter_mut()
        .find(|f| f.client_id == file.client_id)
        .ok_or_else(|| AppError::NotFound(format!("Attachment {}", file.client_id)))?;
    *slot = file.clone();

    save_draft(conn, channel_id, root_id, &draft.message, &files)?;
    Ok(())
}

/// Removes an attachment record from the draft
pub fn remove_draft_file(
    conn: &Connection,
    channel_id: &str,
    root_id: &str,
    client_id: &str,
) -> Result<(), AppError> {
    if let Some(draft) = load_draft(conn, channel_id, root_id)? {
        let files: Vec<FileInfo> = draft
            .files
            .into_iter()
            .filter(|f| f.client_id != client_id)
            .collect();
        save_draft(conn, channel_id, root_id, &draft.message, &files)?;
    }
    Ok(())
}

/// Deletes the draft for a channel or thread
pub fn delete_draft(conn: &Connection, channel_id: &str, root_id: &str) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM drafts WHERE channel_id = ?1 AND root_id = ?2",
        [channel_id, root_id],
    )?;
    Ok(())
}

/// Draft store backed by the app database.
///
/// Opens a connection per call so it can be used from background transfer
/// tasks without sharing a connection across threads.
pub struct SqliteDraftStore;

impl DraftStore for SqliteDraftStore {
    fn update_draft_file(
        &self,
        channel_id: &str,
        root_id: &str,
        file: &FileInfo,
    ) -> Result<(), UploadError> {
        let conn = crate::database::init_database()
            .map_err(|e| UploadError::Store(e.to_string()))?;
        update_draft_file(&conn, channel_id, root_id, file)
            .map_err(|e| UploadError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_load_missing_draft_returns_none() {
        let conn = test_conn();
        assert!(load_draft(&conn, "ch1", "").unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload_draft() {
        let conn = test_conn();
        let file = FileInfo::new("/tmp/a.png", "a.png", 10);

        save_draft(&conn, "ch1", "", "hello", std::slice::from_ref(&file)).unwrap();

        let draft = load_draft(&conn, "ch1", "").unwrap().unwrap();
        assert_eq!(draft.message, "hello");
        assert_eq!(draft.files.len(), 1);
        assert_eq!(draft.files[0].client_id, file.client_id);
    }

    #[test]
    fn test_save_twice_updates_single_row() {
        let conn = test_conn();

        let first = save_draft(&conn, "ch1", "", "one", &[]).unwrap();
        let second = save_draft(&conn, "ch1", "", "two", &[]).unwrap();
        assert_eq!(first, second);

        let draft = load_draft(&conn, "ch1", "").unwrap().unwrap();
        assert_eq!(draft.message, "two");
    }

    #[test]
    fn test_thread_draft_is_separate_from_channel_draft() {
        let conn = test_conn();

        save_draft(&conn, "ch1", "", "channel", &[]).unwrap();
        save_draft(&conn, "ch1", "root1", "thread", &[]).unwrap();

        assert_eq!(load_draft(&conn, "ch1", "").unwrap().unwrap().message, "channel");
        assert_eq!(
            load_draft(&conn, "ch1", "root1").unwrap().unwrap().message,
            "thread"
        );
    }

    #[test]
    fn test_add_file_creates_draft_when_missing() {
        let conn = test_conn();
        let file = FileInfo::new("/tmp/a.png", "a.png", 10);

        add_draft_file(&conn, "ch1", "", &file).unwrap();

        let draft = load_draft(&conn, "ch1", "").unwrap().unwrap();
        assert_eq!(draft.files.len(), 1);
    }

    #[test]
    fn test_update_file_replaces_matching_record_only() {
        let conn = test_conn();
        let a = FileInfo::new("/tmp/a.png", "a.png", 10);
        let b = FileInfo::new("/tmp/b.png", "b.png", 20);
        save_draft(&conn, "ch1", "", "", &[a.clone(), b.clone()]).unwrap();

        let mut failed = a.clone();
        failed.failed = true;
        failed.bytes_read = 5;
        update_draft_file(&conn, "ch1", "", &failed).unwrap();

        let draft = load_draft(&conn, "ch1", "").unwrap().unwrap();
        assert!(draft.files[0].failed);
        assert_eq!(draft.files[0].bytes_read, 5);
        assert!(!draft.files[1].failed);
    }

    #[test]
    fn test_update_file_for_unknown_attachment_fails() {
        let conn = test_conn();
        save_draft(&conn, "ch1", "", "", &[]).unwrap();

        let file = FileInfo::new("/tmp/a.png", "a.png", 10);
        let result = update_draft_file(&conn, "ch1", "", &file);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_remove_file() {
        let conn = test_conn();
        let a = FileInfo::new("/tmp/a.png", "a.png", 10);
        let b = FileInfo::new("/tmp/b.png", "b.png", 20);
        save_draft(&conn, "ch1", "", "", &[a.clone(), b.clone()]).unwrap();

        remove_draft_file(&conn, "ch1", "", &a.client_id).unwrap();

        let draft = load_draft(&conn, "ch1", "").unwrap().unwrap();
        assert_eq!(draft.files.len(), 1);
        assert_eq!(draft.files[0].client_id, b.client_id);
    }

    #[test]
    fn test_delete_draft() {
        let conn = test_conn();
        save_draft(&conn, "ch1", "", "bye", &[]).unwrap();

        delete_draft(&conn, "ch1", "").unwrap();
        assert!(load_draft(&conn, "ch1", "").unwrap().is_none());
    }
}
