use crate::error::{Error, Result};
use crate::ident::derive_id;
use crate::models::bookmark::Bookmark;
use chrono::Local;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Shared storage-engine handle.
///
/// One connection is shared across the stores (`BookmarkDb`, `TokenDb`);
/// each store creates and owns its own table on it. The mutex serializes
/// whole operations, so the check-then-act sequences in `save` and
/// `update_uri` hold up against concurrent callers (HTTP handlers plus
/// any external event source driving the same stores).
pub type DbHandle = Arc<Mutex<Connection>>;

/// Open (or create) the database file and wrap it in a shared handle.
pub fn open(db_path: &Path) -> Result<DbHandle> {
    let conn = Connection::open(db_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory handle, used by tests.
pub fn open_in_memory() -> Result<DbHandle> {
    let conn = Connection::open_in_memory()?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub struct BookmarkDb {
    conn: DbHandle,
}

impl BookmarkDb {
    /// Attach to a shared handle, creating the bookmarks table if it
    /// doesn't already exist.
    pub fn attach(conn: DbHandle) -> Result<Self> {
        let db = Self { conn };
        db.setup_table()?;
        Ok(db)
    }

    pub fn init(db_path: &Path) -> Result<Self> {
        Self::attach(open(db_path)?)
    }

    pub fn init_in_memory() -> Result<Self> {
        Self::attach(open_in_memory()?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("database connection lock poisoned".to_string()))
    }

    fn setup_table(&self) -> Result<()> {
        self.conn()?.execute(
            "CREATE TABLE if not exists bookmarks (
                bookmark_id blob PRIMARY KEY,
                uri text NOT NULL,
                title text NOT NULL,
                create_date timestamp NOT NULL,
                update_date timestamp
            )",
            [],
        )?;
        Ok(())
    }

    fn fetch(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Bookmark>> {
        let mut stmt = conn.prepare(
            "SELECT bookmark_id, uri, title, create_date, update_date
             FROM bookmarks WHERE bookmark_id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Bookmark::new(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            )))
        } else {
            Ok(None)
        }
    }

    /// Save a bookmark, de-duplicating by URI.
    ///
    /// The id is derived from the URI, so a repeat save of the same URI
    /// finds the existing row and returns its id unchanged; the stored
    /// title is not touched (first write wins).
    pub fn save(&self, uri: &str, title: &str) -> Result<Uuid> {
        let id = derive_id(uri);

        let guard = self.conn()?;
        let tx = guard.unchecked_transaction()?;

        if Self::fetch(&tx, id)?.is_some() {
            return Ok(id);
        }

        tx.execute(
            "INSERT INTO bookmarks (bookmark_id, uri, title, create_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, uri, title, Local::now().naive_local()],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Point lookup by id. `None` is a normal outcome, not an error.
    pub fn get(&self, id: Uuid) -> Result<Option<Bookmark>> {
        let guard = self.conn()?;
        Ok(Self::fetch(&guard, id)?)
    }

    /// Every stored bookmark, in storage-native order. An empty store
    /// yields an empty vec.
    pub fn get_all(&self) -> Result<Vec<Bookmark>> {
        let guard = self.conn()?;
        let mut stmt = guard
            .prepare("SELECT bookmark_id, uri, title, create_date, update_date FROM bookmarks")?;
        let rows = stmt.query_map([], |row| {
            Ok(Bookmark::new(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Delete the bookmark if present.
    ///
    /// Returns true when no record with `id` remains afterwards, which
    /// includes the case where it was already absent. False means the
    /// row survived the DELETE, a storage anomaly.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let guard = self.conn()?;
        let tx = guard.unchecked_transaction()?;

        tx.execute("DELETE FROM bookmarks WHERE bookmark_id = ?1", params![id])?;
        let gone = Self::fetch(&tx, id)?.is_none();
        tx.commit()?;
        Ok(gone)
    }

    /// Replace the title, stamping `update_date`. Id and URI are unchanged.
    pub fn update_title(&self, id: Uuid, new_title: &str) -> Result<Bookmark> {
        let guard = self.conn()?;
        let tx = guard.unchecked_transaction()?;

        if Self::fetch(&tx, id)?.is_none() {
            return Err(Error::NotFound(id));
        }

        tx.execute(
            "UPDATE bookmarks SET title = ?1, update_date = ?2 WHERE bookmark_id = ?3",
            params![new_title, Local::now().naive_local(), id],
        )?;
        let updated = Self::fetch(&tx, id)?.ok_or(Error::NotFound(id))?;
        tx.commit()?;
        Ok(updated)
    }

    /// Re-point the bookmark at a new URI, relocating it to the id the
    /// new URI derives.
    ///
    /// If another record already occupies the target id the update is a
    /// conflict and neither record is modified; the caller decides what
    /// happens to the stale one. Updating to the record's current URI
    /// just refreshes `update_date` in place. `create_date` is never
    /// touched.
    pub fn update_uri(&self, id: Uuid, new_uri: &str) -> Result<Bookmark> {
        let guard = self.conn()?;
        let tx = guard.unchecked_transaction()?;

        if Self::fetch(&tx, id)?.is_none() {
            return Err(Error::NotFound(id));
        }

        let new_id = derive_id(new_uri);
        if new_id != id && Self::fetch(&tx, new_id)?.is_some() {
            return Err(Error::Conflict {
                uri: new_uri.to_string(),
                existing: new_id,
            });
        }

        tx.execute(
            "UPDATE bookmarks SET bookmark_id = ?1, uri = ?2, update_date = ?3
             WHERE bookmark_id = ?4",
            params![new_id, new_uri, Local::now().naive_local(), id],
        )?;
        let updated = Self::fetch(&tx, new_id)?.ok_or(Error::NotFound(new_id))?;
        tx.commit()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> BookmarkDb {
        BookmarkDb::init_in_memory().unwrap()
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let db = setup_test_db();

        let id = db.save("https://example.com", "Example").unwrap();
        assert_eq!(id, derive_id("https://example.com"));

        let rec = db.get(id).unwrap().unwrap();
        assert_eq!(rec.id, id);
        assert_eq!(rec.uri, "https://example.com");
        assert_eq!(rec.title, "Example");
        assert!(rec.updated_at.is_none());
    }

    #[test]
    fn test_save_is_idempotent_first_write_wins() {
        let db = setup_test_db();

        let id1 = db.save("https://example.com", "First title").unwrap();
        let id2 = db.save("https://example.com", "Second title").unwrap();
        assert_eq!(id1, id2);

        let rec = db.get(id1).unwrap().unwrap();
        assert_eq!(rec.title, "First title");
        assert_eq!(db.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let db = setup_test_db();
        assert!(db
            .get(derive_id("https://nowhere.invalid"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_get_all_empty_store() {
        let db = setup_test_db();
        assert!(db.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_get_all_returns_every_record() {
        let db = setup_test_db();
        db.save("https://example.com", "One").unwrap();
        db.save("https://example.org", "Two").unwrap();
        db.save("https://rust-lang.org", "Three").unwrap();

        assert_eq!(db.get_all().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = setup_test_db();
        let id = db.save("https://example.com", "Example").unwrap();

        assert!(db.delete(id).unwrap());
        assert!(db.get(id).unwrap().is_none());
        // Deleting an absent record still reports true: nothing remains.
        assert!(db.delete(id).unwrap());
    }

    #[test]
    fn test_update_title() {
        let db = setup_test_db();
        let id = db.save("https://example.com", "Old").unwrap();

        let updated = db.update_title(id, "New").unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.uri, "https://example.com");
        assert_eq!(updated.title, "New");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_title_missing_is_not_found() {
        let db = setup_test_db();
        let id = derive_id("https://nowhere.invalid");
        assert!(matches!(
            db.update_title(id, "New"),
            Err(Error::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_update_uri_relocates_record() {
        let db = setup_test_db();
        let old_id = db.save("https://example.com", "Example").unwrap();
        let before = db.get(old_id).unwrap().unwrap();

        let moved = db.update_uri(old_id, "https://example.org").unwrap();
        assert_eq!(moved.id, derive_id("https://example.org"));
        assert_eq!(moved.uri, "https://example.org");
        assert_eq!(moved.title, "Example");
        assert_eq!(moved.created_at, before.created_at);
        assert!(moved.updated_at.is_some());

        // The old id no longer resolves.
        assert!(db.get(old_id).unwrap().is_none());
        assert!(db.get(moved.id).unwrap().is_some());
    }

    #[test]
    fn test_update_uri_collision_leaves_both_intact() {
        let db = setup_test_db();
        let id_a = db.save("https://example.com", "A").unwrap();
        let id_b = db.save("https://example.org", "B").unwrap();

        let result = db.update_uri(id_a, "https://example.org");
        assert!(matches!(
            result,
            Err(Error::Conflict { existing, .. }) if existing == id_b
        ));

        // Neither record was merged, moved, or deleted.
        let a = db.get(id_a).unwrap().unwrap();
        let b = db.get(id_b).unwrap().unwrap();
        assert_eq!(a.uri, "https://example.com");
        assert_eq!(a.title, "A");
        assert!(a.updated_at.is_none());
        assert_eq!(b.title, "B");
        assert!(b.updated_at.is_none());
    }

    #[test]
    fn test_update_uri_same_uri_touches_in_place() {
        let db = setup_test_db();
        let id = db.save("https://example.com", "Example").unwrap();

        let touched = db.update_uri(id, "https://example.com").unwrap();
        assert_eq!(touched.id, id);
        assert_eq!(touched.uri, "https://example.com");
        assert!(touched.updated_at.is_some());
    }

    #[test]
    fn test_update_uri_missing_is_not_found() {
        let db = setup_test_db();
        let id = derive_id("https://nowhere.invalid");
        assert!(matches!(
            db.update_uri(id, "https://example.com"),
            Err(Error::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.db");

        let id = {
            let db = BookmarkDb::init(&path).unwrap();
            db.save("https://example.com", "Example").unwrap()
        };

        let db = BookmarkDb::init(&path).unwrap();
        let rec = db.get(id).unwrap().unwrap();
        assert_eq!(rec.uri, "https://example.com");
        assert_eq!(rec.title, "Example");
        // Same URI still derives the same id after a restart.
        assert_eq!(db.save("https://example.com", "Other").unwrap(), id);
    }

    #[test]
    fn test_shared_handle_two_stores() {
        let handle = open_in_memory().unwrap();
        let bookmarks = BookmarkDb::attach(handle.clone()).unwrap();
        let tokens = crate::auth::TokenDb::attach(handle).unwrap();

        let id = bookmarks.save("https://example.com", "Example").unwrap();
        let token_id = tokens.save("127.0.0.1", "secret-key").unwrap();

        // Each store only sees its own table.
        assert!(bookmarks.get(id).unwrap().is_some());
        assert!(bookmarks.get(token_id).unwrap().is_none());
        assert!(tokens.get(token_id).unwrap().is_some());
        assert!(tokens.get(id).unwrap().is_none());
    }
}
