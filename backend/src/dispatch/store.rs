//! Persistence collaborator.
//!
//! One trait, two implementations: [`SqliteStore`] writes to the local
//! database, [`InMemoryStore`] keeps everything in a vector for demo mode.
//! Callers never know which one they hold.

use async_trait::async_trait;
use common::model::resident::ParsedResident;
use common::requests::ImporterContext;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ResidentStore: Send + Sync {
    /// Upserts invitations. Addressed rows are keyed by building and email so
    /// re-running a batch does not duplicate them.
    async fn save_invitations(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError>;

    /// Flags the invitation for `email` as sent.
    async fn mark_invited(&self, ctx: &ImporterContext, email: &str) -> Result<(), StoreError>;

    /// Upserts rows of the building roster.
    async fn save_roster(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS invitations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    building_id TEXT NOT NULL,
    invited_by TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    name_key TEXT NOT NULL DEFAULT '',
    email TEXT,
    unit TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    sent_at TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS invitations_addressed
    ON invitations (building_id, email) WHERE email IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS invitations_unaddressed
    ON invitations (building_id, name_key, unit) WHERE email IS NULL;
CREATE TABLE IF NOT EXISTS building_roster (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    building_id TEXT NOT NULL,
    added_by TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    name_key TEXT NOT NULL DEFAULT '',
    email TEXT,
    unit TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE UNIQUE INDEX IF NOT EXISTS building_roster_addressed
    ON building_roster (building_id, email) WHERE email IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS building_roster_unaddressed
    ON building_roster (building_id, name_key, unit) WHERE email IS NULL;
";

/// Upsert statements for one table: addressed rows are keyed by
/// (building, email), unaddressed rows by (building, name key, unit).
struct Upserts {
    addressed: &'static str,
    unaddressed: &'static str,
}

const INVITATION_UPSERTS: Upserts = Upserts {
    addressed: "
INSERT INTO invitations (building_id, invited_by, name, name_key, email, unit, phone)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT (building_id, email) WHERE email IS NOT NULL DO UPDATE SET
    invited_by = excluded.invited_by,
    name = excluded.name,
    name_key = excluded.name_key,
    unit = excluded.unit,
    phone = excluded.phone",
    unaddressed: "
INSERT INTO invitations (building_id, invited_by, name, name_key, email, unit, phone)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT (building_id, name_key, unit) WHERE email IS NULL DO UPDATE SET
    invited_by = excluded.invited_by,
    name = excluded.name,
    phone = excluded.phone",
};

const ROSTER_UPSERTS: Upserts = Upserts {
    addressed: "
INSERT INTO building_roster (building_id, added_by, name, name_key, email, unit, phone)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT (building_id, email) WHERE email IS NOT NULL DO UPDATE SET
    added_by = excluded.added_by,
    name = excluded.name,
    name_key = excluded.name_key,
    unit = excluded.unit,
    phone = excluded.phone",
    unaddressed: "
INSERT INTO building_roster (building_id, added_by, name, name_key, email, unit, phone)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT (building_id, name_key, unit) WHERE email IS NULL DO UPDATE SET
    added_by = excluded.added_by,
    name = excluded.name,
    phone = excluded.phone",
};

/// Case and spacing insensitive form of a name, part of the key of rows
/// without an email.
fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// SQLite-backed store. Opens a connection per operation on a blocking thread.
#[derive(Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { path })
    }

    async fn with_connection<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(path)?;
            work(&mut conn).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("join error: {}", e)))?
    }

    async fn upsert_all(
        &self,
        sql: &'static Upserts,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError> {
        let ctx = ctx.clone();
        let residents = residents.to_vec();
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut addressed = tx.prepare(sql.addressed)?;
                let mut unaddressed = tx.prepare(sql.unaddressed)?;
                for r in &residents {
                    let email = (!r.email.is_empty()).then_some(r.email.as_str());
                    let stmt = if email.is_some() { &mut addressed } else { &mut unaddressed };
                    stmt.execute(params![
                        ctx.building_id,
                        ctx.actor_id,
                        r.name,
                        name_key(&r.name),
                        email,
                        r.unit,
                        r.phone
                    ])?;
                }
            }
            tx.commit()
        })
        .await
    }
}

#[async_trait]
impl ResidentStore for SqliteStore {
    async fn save_invitations(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError> {
        self.upsert_all(&INVITATION_UPSERTS, ctx, residents).await
    }

    async fn mark_invited(&self, ctx: &ImporterContext, email: &str) -> Result<(), StoreError> {
        let building_id = ctx.building_id.clone();
        let email = email.to_string();
        self.with_connection(move |conn| {
            conn.execute(
                "UPDATE invitations SET status = 'sent', sent_at = CURRENT_TIMESTAMP
                 WHERE building_id = ?1 AND email = ?2",
                params![building_id, email],
            )
            .map(|_| ())
        })
        .await
    }

    async fn save_roster(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError> {
        self.upsert_all(&ROSTER_UPSERTS, ctx, residents).await
    }
}

/// A row kept by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResident {
    pub building_id: String,
    pub actor_id: String,
    pub resident: ParsedResident,
    pub invited: bool,
}

/// Store used in demo mode. Same upsert semantics as [`SqliteStore`].
#[derive(Default)]
pub struct InMemoryStore {
    invitations: Mutex<Vec<StoredResident>>,
    roster: Mutex<Vec<StoredResident>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invitations(&self) -> Vec<StoredResident> {
        self.invitations.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn roster(&self) -> Vec<StoredResident> {
        self.roster.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn upsert(
        table: &Mutex<Vec<StoredResident>>,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError> {
        let mut rows = table
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".into()))?;
        for r in residents {
            let key = name_key(&r.name);
            let existing = rows.iter_mut().find(|s| {
                s.building_id == ctx.building_id
                    && if r.email.is_empty() {
                        s.resident.email.is_empty()
                            && name_key(&s.resident.name) == key
                            && s.resident.unit == r.unit
                    } else {
                        s.resident.email == r.email
                    }
            });
            match existing {
                Some(stored) => {
                    stored.actor_id = ctx.actor_id.clone();
                    stored.resident = r.clone();
                }
                None => rows.push(StoredResident {
                    building_id: ctx.building_id.clone(),
                    actor_id: ctx.actor_id.clone(),
                    resident: r.clone(),
                    invited: false,
                }),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResidentStore for InMemoryStore {
    async fn save_invitations(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError> {
        Self::upsert(&self.invitations, ctx, residents)
    }

    async fn mark_invited(&self, ctx: &ImporterContext, email: &str) -> Result<(), StoreError> {
        let mut rows = self
            .invitations
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".into()))?;
        rows.iter_mut()
            .filter(|s| s.building_id == ctx.building_id && s.resident.email == email)
            .for_each(|s| s.invited = true);
        Ok(())
    }

    async fn save_roster(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<(), StoreError> {
        Self::upsert(&self.roster, ctx, residents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ImporterContext {
        ImporterContext {
            building_id: "b1".into(),
            actor_id: "manager-1".into(),
            building_name: "Maple Court".into(),
        }
    }

    fn resident(name: &str, email: &str) -> ParsedResident {
        ParsedResident {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    fn count(path: &Path, sql: &str) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[tokio::test]
    async fn sqlite_upserts_by_building_and_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residents.sqlite");
        let store = SqliteStore::open(&path).unwrap();

        let batch = vec![resident("Ann", "ann@x.com"), resident("No Mail", ""), resident("Also None", "")];
        store.save_invitations(&ctx(), &batch).await.unwrap();
        store
            .save_invitations(&ctx(), &[resident("Ann Lee", "ann@x.com"), resident(" no  MAIL ", "")])
            .await
            .unwrap();

        assert_eq!(count(&path, "SELECT COUNT(*) FROM invitations"), 3);
        assert_eq!(
            count(&path, "SELECT COUNT(*) FROM invitations WHERE name = 'Ann Lee'"),
            1
        );

        store.mark_invited(&ctx(), "ann@x.com").await.unwrap();
        assert_eq!(
            count(&path, "SELECT COUNT(*) FROM invitations WHERE status = 'sent' AND sent_at IS NOT NULL"),
            1
        );
    }

    #[tokio::test]
    async fn sqlite_resaving_unaddressed_rows_does_not_duplicate_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residents.sqlite");
        let store = SqliteStore::open(&path).unwrap();

        let mut cy = resident("Cy Dahl", "");
        cy.unit = "7".into();
        let mut cy_next_door = resident("Cy Dahl", "");
        cy_next_door.unit = "8".into();
        let batch = vec![resident("Ann", "ann@x.com"), cy, cy_next_door];

        store.save_invitations(&ctx(), &batch).await.unwrap();
        store.save_invitations(&ctx(), &batch).await.unwrap();
        store.save_roster(&ctx(), &batch).await.unwrap();
        store.save_roster(&ctx(), &batch).await.unwrap();

        assert_eq!(count(&path, "SELECT COUNT(*) FROM invitations"), 3);
        assert_eq!(
            count(&path, "SELECT COUNT(*) FROM invitations WHERE name = 'Cy Dahl' AND unit = '7'"),
            1
        );
        assert_eq!(count(&path, "SELECT COUNT(*) FROM building_roster"), 3);
    }

    #[tokio::test]
    async fn sqlite_roster_is_a_separate_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residents.sqlite");
        let store = SqliteStore::open(&path).unwrap();

        store
            .save_roster(&ctx(), &[resident("Ann", "ann@x.com"), resident("Bob", "")])
            .await
            .unwrap();
        assert_eq!(count(&path, "SELECT COUNT(*) FROM building_roster"), 2);
        assert_eq!(count(&path, "SELECT COUNT(*) FROM invitations"), 0);
    }

    #[tokio::test]
    async fn in_memory_store_matches_upsert_semantics() {
        let store = InMemoryStore::new();
        store
            .save_invitations(&ctx(), &[resident("Ann", "ann@x.com"), resident("Bob", "")])
            .await
            .unwrap();
        store
            .save_invitations(&ctx(), &[resident("Ann Lee", "ann@x.com"), resident("Bob", "")])
            .await
            .unwrap();
        store.mark_invited(&ctx(), "ann@x.com").await.unwrap();

        let rows = store.invitations();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].resident.name, "Ann Lee");
        assert!(rows[0].invited);
        assert!(store.roster().is_empty());
    }
}
