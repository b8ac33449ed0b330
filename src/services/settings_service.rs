use crate::error::AppError;
use crate::models::ServerSettings;
use rusqlite::{Connection, Result};

/// Loads the server settings from the database
pub fn load_server_settings(conn: &Connection) -> Result<Option<ServerSettings>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, server_url, auth_token, display_name, created_at, updated_at
         FROM server_settings
         ORDER BY id DESC
         LIMIT 1",
    )?;

    let result = stmt.query_row([], |row| {
        Ok(ServerSettings {
            id: row.get(0)?,
            server_url: row.get(1)?,
            auth_token: row.get(2)?,
            display_name: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    });

    match result {
        Ok(settings) => Ok(Some(settings)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// Saves or updates the server settings
pub fn save_server_settings(conn: &Connection, settings: &ServerSettings) -> Result<i64, AppError> {
    if settings.server_url.is_empty() {
        return Err(AppError::Validation("Server URL must not be empty".to_string()));
    }

    let existing = load_server_settings(conn)?;

    if let Some(existing) = existing {
        conn.execute(
            "UPDATE server_settings
             SET server_url = ?1, auth_token = ?2, display_name = ?3
             WHERE id = ?4",
            (
                &settings.server_url,
                &settings.auth_token,
                &settings.display_name,
                existing.id,
            ),
        )?;
        Ok(existing.id)
    } else {
        conn.execute(
            "INSERT INTO server_settings (server_url, auth_token, display_name)
             VALUES (?1, ?2, ?3)",
            (
                &settings.server_url,
                &settings.auth_token,
                &settings.display_name,
            ),
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// Deletes all server settings
pub fn delete_server_settings(conn: &Connection) -> Result<(), AppError> {
    conn.execute("DELETE FROM server_settings", [])?;
    Ok(())
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
    fn test_load_without_settings_returns_none() {
        let conn = test_conn();
        assert!(load_server_settings(&conn).unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let conn = test_conn();
        let settings = ServerSettings::new(
            "https://chat.example.com/",
            Some("token123".to_string()),
            "Alice",
        );

        save_server_settings(&conn, &settings).unwrap();

        let loaded = load_server_settings(&conn).unwrap().unwrap();
        assert_eq!(loaded.server_url, "https://chat.example.com");
        assert_eq!(loaded.auth_token.as_deref(), Some("token123"));
        assert_eq!(loaded.display_name, "Alice");
    }

    #[test]
    fn test_save_twice_updates_existing_row() {
        let conn = test_conn();
        let first = save_server_settings(
            &conn,
            &ServerSettings::new("https://one.example.com", None, ""),
        )
        .unwrap();
        let second = save_server_settings(
            &conn,
            &ServerSettings::new("https://two.example.com", None, ""),
        )
        .unwrap();

        assert_eq!(first, second);
        let loaded = load_server_settings(&conn).unwrap().unwrap();
        assert_eq!(loaded.server_url, "https://two.example.com");
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let conn = test_conn();
        let result = save_server_settings(&conn, &ServerSettings::new("", None, ""));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
