// Database schema definitions and migration system
//
// This module defines the SQLite schema for templates and macros
// and provides a migration system for schema changes.

use super::{TursoClient, TursoError};

/// Current schema version
const SCHEMA_VERSION: i32 = 3;

/// SQL statements to create all tables (each as a separate string)
const CREATE_TABLES: &[&str] = &[
    // Text templates, optionally bound to a trigger word
    r#"CREATE TABLE IF NOT EXISTS text_expansion (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        department TEXT NOT NULL DEFAULT '',
        name TEXT NOT NULL,
        replacement TEXT NOT NULL,
        created_at TEXT NOT NULL,
        trigger TEXT
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_text_expansion_scope ON text_expansion(user_id, department)"#,
    // Recorded macros; actions are stored as a JSON array
    MACRO_TABLE,
    MACRO_INDEX,
];

const MACRO_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS shortcut_macro (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        department TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL,
        trigger_kind TEXT NOT NULL,
        trigger_value TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 0,
        actions_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"#;

const MACRO_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS idx_shortcut_macro_scope ON shortcut_macro(user_id, department)"#;

/// Initialize the database schema.
///
/// Creates all tables if they don't exist and runs any pending migrations.
/// Call once at startup, after the TursoClient is created.
pub async fn initialize_schema(client: &TursoClient) -> Result<(), TursoError> {
    let current_version = get_schema_version(client).await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            (),
        )
        .await?;

    if current_version == 0 {
        crate::info!("Initializing shortcut database schema (version {})", SCHEMA_VERSION);

        for statement in CREATE_TABLES {
            client.execute(statement, ()).await?;
        }

        set_schema_version(client, SCHEMA_VERSION).await?;
        crate::info!("Shortcut database schema initialized successfully");
    } else if current_version < SCHEMA_VERSION {
        crate::info!(
            "Migrating shortcut database from version {} to {}",
            current_version,
            SCHEMA_VERSION
        );
        run_migrations(client, current_version, SCHEMA_VERSION).await?;
        crate::info!("Shortcut database migration complete");
    } else {
        crate::debug!("Shortcut database schema is up to date (version {})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database.
/// Returns 0 if the schema_version table doesn't exist yet.
async fn get_schema_version(client: &TursoClient) -> Result<i32, TursoError> {
    let mut rows = client
        .query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='schema_version'",
            (),
        )
        .await?;

    if rows.next().await.map_err(|e| TursoError::Query(e.to_string()))?.is_none() {
        return Ok(0);
    }

    let mut rows = client
        .query("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1", ())
        .await?;

    match rows.next().await.map_err(|e| TursoError::Query(e.to_string()))? {
        Some(row) => {
            let version: i32 = row.get(0).map_err(|e| TursoError::Query(e.to_string()))?;
            Ok(version)
        }
        None => Ok(0),
    }
}

async fn set_schema_version(client: &TursoClient, version: i32) -> Result<(), TursoError> {
    client
        .execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            libsql::params![version],
        )
        .await?;
    Ok(())
}

/// Run migrations from one version to another.
async fn run_migrations(
    client: &TursoClient,
    from_version: i32,
    to_version: i32,
) -> Result<(), TursoError> {
    for version in (from_version + 1)..=to_version {
        match version {
            2 => migrate_v1_to_v2(client).await?,
            3 => migrate_v2_to_v3(client).await?,
            _ => {
                crate::debug!("No migration needed for version {}", version);
            }
        }
        set_schema_version(client, version).await?;
    }
    Ok(())
}

/// v1 -> v2: templates gain an optional trigger word.
async fn migrate_v1_to_v2(client: &TursoClient) -> Result<(), TursoError> {
    crate::info!("Running migration v1 -> v2: adding trigger column to text_expansion");
    client
        .execute("ALTER TABLE text_expansion ADD COLUMN trigger TEXT", ())
        .await?;
    Ok(())
}

/// v2 -> v3: macro table.
async fn migrate_v2_to_v3(client: &TursoClient) -> Result<(), TursoError> {
    crate::info!("Running migration v2 -> v3: creating shortcut_macro table");
    client.execute(MACRO_TABLE, ()).await?;
    client.execute(MACRO_INDEX, ()).await?;
    Ok(())
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
