use crate::db::DbHandle;
use crate::error::{Error, Result};
use crate::models::token::AuthToken;
use chrono::Local;
use rusqlite::{params, Connection};
use std::sync::MutexGuard;
use uuid::Uuid;

/// Store for externally-issued authentication tokens.
///
/// Lives on the same connection handle as `BookmarkDb` but owns its own
/// table and lifecycle. Ids are random v4 UUIDs; there is nothing to
/// de-duplicate here.
pub struct TokenDb {
    conn: DbHandle,
}

impl TokenDb {
    /// Attach to a shared handle, creating the tokens table if it
    /// doesn't already exist.
    pub fn attach(conn: DbHandle) -> Result<Self> {
        let db = Self { conn };
        db.setup_table()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("database connection lock poisoned".to_string()))
    }

    fn setup_table(&self) -> Result<()> {
        self.conn()?.execute(
            "CREATE TABLE if not exists tokens (
                token_id blob PRIMARY KEY,
                client_ip text NOT NULL,
                auth_key text NOT NULL,
                active boolean NOT NULL,
                create_date timestamp NOT NULL,
                update_date timestamp
            )",
            [],
        )?;
        Ok(())
    }

    fn fetch(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<AuthToken>> {
        let mut stmt = conn.prepare(
            "SELECT token_id, client_ip, auth_key, active, create_date, update_date
             FROM tokens WHERE token_id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(AuthToken::new(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            )))
        } else {
            Ok(None)
        }
    }

    /// Record a token for a client address. New tokens start active.
    pub fn save(&self, client_ip: &str, auth_key: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();

        self.conn()?.execute(
            "INSERT INTO tokens (token_id, client_ip, auth_key, active, create_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, client_ip, auth_key, true, Local::now().naive_local()],
        )?;
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<AuthToken>> {
        let guard = self.conn()?;
        Ok(Self::fetch(&guard, id)?)
    }

    pub fn get_all(&self) -> Result<Vec<AuthToken>> {
        let guard = self.conn()?;
        let mut stmt = guard.prepare(
            "SELECT token_id, client_ip, auth_key, active, create_date, update_date FROM tokens",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AuthToken::new(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Flip whether requests bearing this token's key are honored.
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<AuthToken> {
        let guard = self.conn()?;
        let tx = guard.unchecked_transaction()?;

        if Self::fetch(&tx, id)?.is_none() {
            return Err(Error::NotFound(id));
        }

        tx.execute(
            "UPDATE tokens SET active = ?1, update_date = ?2 WHERE token_id = ?3",
            params![active, Local::now().naive_local(), id],
        )?;
        let updated = Self::fetch(&tx, id)?.ok_or(Error::NotFound(id))?;
        tx.commit()?;
        Ok(updated)
    }

    /// Same contract as bookmark deletion: true when no record remains.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let guard = self.conn()?;
        let tx = guard.unchecked_transaction()?;

        tx.execute("DELETE FROM tokens WHERE token_id = ?1", params![id])?;
        let gone = Self::fetch(&tx, id)?.is_none();
        tx.commit()?;
        Ok(gone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_test_db() -> TokenDb {
        TokenDb::attach(db::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let db = setup_test_db();

        let id = db.save("127.0.0.1", "secret-key").unwrap();
        let token = db.get(id).unwrap().unwrap();

        assert_eq!(token.id, id);
        assert_eq!(token.client_ip, "127.0.0.1");
        assert_eq!(token.auth_key, "secret-key");
        assert!(token.active);
        assert!(token.updated_at.is_none());
    }

    #[test]
    fn test_ids_are_random_not_content_derived() {
        let db = setup_test_db();

        let id1 = db.save("127.0.0.1", "secret-key").unwrap();
        let id2 = db.save("127.0.0.1", "secret-key").unwrap();

        // Identical rows still get distinct ids, unlike bookmarks.
        assert_ne!(id1, id2);
        assert_eq!(db.get_all().unwrap().len(), 2);
    }

    #[test]
    fn test_set_active_lifecycle() {
        let db = setup_test_db();
        let id = db.save("10.0.0.7", "another-key").unwrap();

        let revoked = db.set_active(id, false).unwrap();
        assert!(!revoked.active);
        assert!(revoked.updated_at.is_some());

        let restored = db.set_active(id, true).unwrap();
        assert!(restored.active);
    }

    #[test]
    fn test_set_active_missing_is_not_found() {
        let db = setup_test_db();
        let id = Uuid::new_v4();
        assert!(matches!(
            db.set_active(id, false),
            Err(Error::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = setup_test_db();
        let id = db.save("127.0.0.1", "secret-key").unwrap();

        assert!(db.delete(id).unwrap());
        assert!(db.get(id).unwrap().is_none());
        assert!(db.delete(id).unwrap());
    }
}
