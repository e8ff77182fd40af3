//! SQLite implementation of the ContentStore trait.
//!
//! This is the persistent backend for the Recipe Kernel. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use recipe_kernel_core::ContentId;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::ContentStore;

/// SQLite-based content store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteContentStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let id = ContentId::for_bytes(bytes);
        let data = bytes.to_vec();
        let key = id.clone();

        let inserted = self
            .blocking(move |conn| {
                let now = now_millis();
                let tx = conn.transaction()?;

                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO blobs (content_id, data, size, stored_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![key.as_str(), data, data.len() as i64, now],
                )?;
                tx.execute(
                    "INSERT OR IGNORE INTO pins (content_id, pinned_at) VALUES (?1, ?2)",
                    params![key.as_str(), now],
                )?;

                tx.commit()?;
                Ok(inserted > 0)
            })
            .await?;

        tracing::trace!(%id, new = inserted, "stored blob");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>> {
        let key = id.clone();

        self.blocking(move |conn| {
            let data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM blobs WHERE content_id = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(data.map(Bytes::from))
        })
        .await
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        let key = id.clone();

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blobs WHERE content_id = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn pin(&self, id: &ContentId) -> Result<()> {
        let key = id.clone();

        self.blocking(move |conn| {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blobs WHERE content_id = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound(key));
            }

            conn.execute(
                "INSERT OR IGNORE INTO pins (content_id, pinned_at) VALUES (?1, ?2)",
                params![key.as_str(), now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn unpin(&self, id: &ContentId) -> Result<()> {
        let key = id.clone();

        self.blocking(move |conn| {
            let removed = conn.execute(
                "DELETE FROM pins WHERE content_id = ?1",
                params![key.as_str()],
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn is_pinned(&self, id: &ContentId) -> Result<bool> {
        let key = id.clone();

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM pins WHERE content_id = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn pinned(&self) -> Result<Vec<ContentId>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT content_id FROM pins ORDER BY content_id")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .map(|r| r.map(ContentId::new))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }

    async fn gc(&self) -> Result<usize> {
        let removed = self
            .blocking(|conn| {
                let removed = conn.execute(
                    "DELETE FROM blobs
                     WHERE content_id NOT IN (SELECT content_id FROM pins)",
                    [],
                )?;
                Ok(removed)
            })
            .await?;

        tracing::debug!(removed, "garbage-collected unpinned blobs");
        Ok(removed)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
