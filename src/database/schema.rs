use rusqlite::{Connection, Result};

/// Initialize complete database schema for the RelayChat app
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Schema version table for future migrations
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Check if schema already exists
    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_schema(conn)?;
        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Create the complete schema (version 1)
fn create_schema(conn: &Connection) -> Result<()> {
    // Table: drafts (one draft per channel or thread, attachments as JSON)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS drafts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT NOT NULL,
            root_id TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL DEFAULT '',
            files TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(channel_id, root_id)
        )",
        [],
    )?;

    // Index for drafts
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_drafts_channel ON drafts(channel_id)",
        [],
    )?;

    // Trigger for updated_at in drafts
    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS update_drafts_timestamp
         AFTER UPDATE ON drafts
         BEGIN
            UPDATE drafts SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
         END",
        [],
    )?;

    // Table: server_settings (chat server connection)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS server_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            server_url TEXT NOT NULL,
            auth_token TEXT,
            display_name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Trigger for updated_at in server_settings
    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS update_server_settings_timestamp
         AFTER UPDATE ON server_settings
         BEGIN
            UPDATE server_settings SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
         END",
        [],
    )?;

    Ok(())
}
