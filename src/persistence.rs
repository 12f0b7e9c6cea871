//! # SQLite Document Store
//!
//! Keeps encoded documents on disk in a single `documents` table keyed by
//! `(collection, key)`. Each row also records when it was last written so
//! stale local copies can be spotted when syncing with the remote database.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::store::DocumentStore;

/// Document store backed by SQLite.
pub struct SqliteStore {
    db: Connection,
    db_path: String,
}

impl SqliteStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) a store at the given database path.
    pub fn open(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        log::info!("[Store] Opened SQLite store at {}", db_path);

        Ok(Self {
            db,
            db_path: db_path.to_string(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                data BLOB NOT NULL,
                updated_at INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (collection, key)
            );
        "#,
        )?;
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete every document.
    pub fn clear(&mut self) -> Result<()> {
        self.db.execute("DELETE FROM documents", [])?;
        log::info!("[Store] Cleared {}", self.db_path);
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn read(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let data = self
            .db
            .query_row(
                "SELECT data FROM documents WHERE collection = ? AND key = ?",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data)
    }

    fn write(&mut self, collection: &str, key: &str, data: &[u8]) -> Result<()> {
        self.db.execute(
            "INSERT OR REPLACE INTO documents (collection, key, data, updated_at)
             VALUES (?, ?, ?, strftime('%s', 'now'))",
            params![collection, key, data],
        )?;
        Ok(())
    }

    fn remove(&mut self, collection: &str, key: &str) -> Result<bool> {
        let removed = self.db.execute(
            "DELETE FROM documents WHERE collection = ? AND key = ?",
            params![collection, key],
        )?;
        Ok(removed > 0)
    }

    fn keys(&self, collection: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT key FROM documents WHERE collection = ? ORDER BY key")?;
        let keys = stmt
            .query_map(params![collection], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}
