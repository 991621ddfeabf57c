//! SQLite case store
//!
//! Thin persistence wrapper for the content engine:
//! - Case metadata (one row per case database)
//! - Parent containers (images, volumes, pools backing physical reads)
//! - Content objects (regular and virtual)
//! - File extents (ordered byte ranges of virtual content)
//!
//! The extent rows mirror the classic layout-file shape: byte_start,
//! byte_len and a sequence column whose ascending order is the only valid
//! reconstruction order.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::content::{Content, RegularContent, VirtualContent};
use crate::error::{ContentError, ContentResult};
use crate::extent::Extent;

/// Database connection wrapper for thread-safe access
pub struct CaseStore {
    conn: Mutex<Connection>,
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseInfo {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRecord {
    pub obj_id: i64,
    pub path: String,
    pub description: Option<String>,
    pub added_at: String,
}

// ============================================================================
// Store Implementation
// ============================================================================

impl CaseStore {
    /// Open (or create) a case database at the given path.
    pub fn open(db_path: &Path, case_name: &str) -> ContentResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path)?;
        let store = CaseStore {
            conn: Mutex::new(conn),
        };
        store.init_schema(case_name)?;
        info!(?db_path, case_name, "Opened case database");
        Ok(store)
    }

    /// In-memory case database, used by tests and scratch sessions.
    pub fn open_in_memory(case_name: &str) -> ContentResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = CaseStore {
            conn: Mutex::new(conn),
        };
        store.init_schema(case_name)?;
        Ok(store)
    }

    /// Create all tables if they don't exist
    fn init_schema(&self, case_name: &str) -> ContentResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Case metadata (single row)
            CREATE TABLE IF NOT EXISTS case_info (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Parent containers (images, volumes, pools)
            CREATE TABLE IF NOT EXISTS parent_containers (
                obj_id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                description TEXT,
                added_at TEXT NOT NULL
            );

            -- Content objects (regular and virtual)
            CREATE TABLE IF NOT EXISTS content_objects (
                obj_id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                content_type TEXT NOT NULL,   -- 'regular' | 'virtual'
                start_offset INTEGER,         -- regular content only
                size INTEGER,                 -- regular content only; virtual size derives from extents
                md5 TEXT,
                added_at TEXT NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES parent_containers(obj_id) ON DELETE CASCADE
            );

            -- Ordered byte ranges of virtual content
            CREATE TABLE IF NOT EXISTS file_extents (
                content_id INTEGER NOT NULL,
                byte_start INTEGER NOT NULL,
                byte_len INTEGER NOT NULL,
                sequence INTEGER NOT NULL,
                PRIMARY KEY (content_id, sequence),
                FOREIGN KEY (content_id) REFERENCES content_objects(obj_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_content_parent ON content_objects(parent_id);
            CREATE INDEX IF NOT EXISTS idx_extents_content ON file_extents(content_id);
        "#,
        )?;

        // Seed the case row on first open
        let existing: Option<String> = conn
            .query_row("SELECT id FROM case_info LIMIT 1", [], |row| row.get(0))
            .optional()?;
        if existing.is_none() {
            let id = uuid::Uuid::new_v4().to_string();
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO case_info (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![id, case_name, now],
            )?;
        }

        Ok(())
    }

    pub fn case_info(&self) -> ContentResult<CaseInfo> {
        let conn = self.conn.lock().unwrap();
        let info = conn.query_row(
            "SELECT id, name, created_at FROM case_info LIMIT 1",
            [],
            |row| {
                Ok(CaseInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )?;
        Ok(info)
    }

    // ========================================================================
    // Parent Container Operations
    // ========================================================================

    pub fn add_parent(&self, path: &str, description: Option<&str>) -> ContentResult<i64> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO parent_containers (path, description, added_at) VALUES (?1, ?2, ?3)",
            params![path, description, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn parents(&self) -> ContentResult<Vec<ParentRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT obj_id, path, description, added_at FROM parent_containers ORDER BY obj_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ParentRecord {
                obj_id: row.get(0)?,
                path: row.get(1)?,
                description: row.get(2)?,
                added_at: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn parent_path(&self, parent_id: i64) -> ContentResult<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT path FROM parent_containers WHERE obj_id = ?1",
            params![parent_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(ContentError::MissingParent(parent_id))
    }

    // ========================================================================
    // Content Object Operations
    // ========================================================================

    /// Register regular content: one contiguous region of the parent.
    pub fn add_regular_content(
        &self,
        parent_id: i64,
        name: &str,
        start_offset: u64,
        size: u64,
    ) -> ContentResult<i64> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO content_objects (parent_id, name, content_type, start_offset, size, added_at)
             VALUES (?1, ?2, 'regular', ?3, ?4, ?5)",
            params![parent_id, name, start_offset as i64, size as i64, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Register virtual content with its extents in one transaction.
    pub fn add_virtual_content(
        &self,
        parent_id: i64,
        name: &str,
        extents: &[Extent],
    ) -> ContentResult<i64> {
        let mut conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO content_objects (parent_id, name, content_type, added_at)
             VALUES (?1, ?2, 'virtual', ?3)",
            params![parent_id, name, now],
        )?;
        let obj_id = tx.last_insert_rowid();

        for extent in extents {
            tx.execute(
                "INSERT INTO file_extents (content_id, byte_start, byte_len, sequence)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    obj_id,
                    extent.start_offset as i64,
                    extent.length as i64,
                    extent.sequence as i64
                ],
            )?;
        }
        tx.commit()?;

        Ok(obj_id)
    }

    /// Load a content object by id.
    pub fn get_content(&self, obj_id: i64) -> ContentResult<Content> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT parent_id, name, content_type, start_offset, size
                 FROM content_objects WHERE obj_id = ?1",
                params![obj_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()?;

        let (parent_id, name, content_type, start_offset, size) =
            row.ok_or(ContentError::MissingContent(obj_id))?;

        match content_type.as_str() {
            "regular" => Ok(Content::Regular(RegularContent::new(
                obj_id,
                parent_id,
                name,
                start_offset.unwrap_or(0) as u64,
                size.unwrap_or(0) as u64,
            ))),
            "virtual" => Ok(Content::Virtual(VirtualContent::new(
                obj_id, parent_id, name,
            ))),
            other => Err(ContentError::InvalidDescriptor(format!(
                "Unknown content type '{}' for object {}",
                other, obj_id
            ))),
        }
    }

    /// Content object ids under a parent, in registration order.
    pub fn content_ids_for_parent(&self, parent_id: i64) -> ContentResult<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT obj_id FROM content_objects WHERE parent_id = ?1 ORDER BY obj_id",
        )?;
        let rows = stmt.query_map(params![parent_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ========================================================================
    // Extent Operations
    // ========================================================================

    /// Load the extents of a virtual content object, ordered by sequence
    /// ascending. The stored rows do not carry the parent id; it is filled
    /// in from the owning object.
    pub fn load_extents(&self, content_id: i64) -> ContentResult<Vec<Extent>> {
        let conn = self.conn.lock().unwrap();

        let parent_id: Option<i64> = conn
            .query_row(
                "SELECT parent_id FROM content_objects WHERE obj_id = ?1",
                params![content_id],
                |row| row.get(0),
            )
            .optional()?;
        let parent_id = parent_id.ok_or(ContentError::MissingContent(content_id))?;

        let mut stmt = conn.prepare(
            "SELECT byte_start, byte_len, sequence FROM file_extents
             WHERE content_id = ?1 ORDER BY sequence ASC",
        )?;

        let rows = stmt.query_map(params![content_id], |row| {
            Ok(Extent {
                parent_id,
                start_offset: row.get::<_, i64>(0)? as u64,
                length: row.get::<_, i64>(1)? as u64,
                sequence: row.get::<_, i64>(2)? as u64,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ========================================================================
    // Hash Bookkeeping
    // ========================================================================

    pub fn set_md5(&self, content_id: i64, md5: &str) -> ContentResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE content_objects SET md5 = ?1 WHERE obj_id = ?2",
            params![md5, content_id],
        )?;
        if updated == 0 {
            return Err(ContentError::MissingContent(content_id));
        }
        Ok(())
    }

    pub fn get_md5(&self, content_id: i64) -> ContentResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT md5 FROM content_objects WHERE obj_id = ?1",
                params![content_id],
                |row| row.get(0),
            )
            .optional()?;
        row.ok_or(ContentError::MissingContent(content_id))
    }
}
