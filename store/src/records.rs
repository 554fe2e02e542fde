//! SQLite-backed user record store.
//!
//! One row per user, keyed by a random record id, with a unique index over
//! the normalized identity key. Structured fields (brand, profile, personas,
//! activities) are stored as JSON columns; scalar fields stay relational so
//! lookups and uniqueness checks run in SQL.
//!
//! Databases written before the avatar feature lack the `avatar_ref` column.
//! Opening such a database adds the column in place, guarded by a
//! `table_info` probe, so old records keep loading after an upgrade.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use atelier_types::{
    ActivityLog, Persona, Progress, RecordId, UserPatch, UserRecord, normalize_identity,
};

use crate::credential;
use crate::db_path::prepare_db_path;
use crate::error::StoreError;

/// Outcome of a credential check against a stored record.
#[derive(Debug)]
pub enum CredentialCheck {
    /// Identity found and the secret matched. The record is returned with
    /// its access time already bumped.
    Verified(Box<UserRecord>),
    /// No record under this identity.
    UnknownIdentity,
    /// Identity found but the secret did not match.
    BadCredential,
}

/// Persistent store of user records.
pub struct RecordStore {
    db: Connection,
}

impl RecordStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            identity_key TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            credential_digest TEXT NOT NULL,
            credential_salt TEXT NOT NULL,
            brand_json TEXT,
            profile_json TEXT,
            personas_json TEXT,
            activities_json TEXT NOT NULL DEFAULT '[]',
            progress INTEGER NOT NULL DEFAULT 0,
            last_access TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_identity
        ON users(identity_key);
    ";

    /// Open or create the record store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        prepare_db_path(path)?;

        let db = Connection::open(path)?;
        Self::initialize(db)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory()?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self, StoreError> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )?;
        db.execute_batch(Self::SCHEMA)?;
        Self::ensure_avatar_column(&db)?;
        tracing::debug!("record store ready");
        Ok(Self { db })
    }

    fn ensure_avatar_column(db: &Connection) -> Result<(), StoreError> {
        let mut stmt = db.prepare("PRAGMA table_info(users)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        if !columns.iter().any(|name| name == "avatar_ref") {
            db.execute("ALTER TABLE users ADD COLUMN avatar_ref TEXT", [])?;
            tracing::info!("added avatar_ref column to records database");
        }
        Ok(())
    }

    /// Look up a record by raw identity. The probe is normalized first, so
    /// lookups match no matter how the identity was cased.
    pub fn find_by_identity(&self, identity: &str) -> Result<Option<UserRecord>, StoreError> {
        load_by_key(&self.db, &normalize_identity(identity))
    }

    /// Load a record by id.
    pub fn get(&self, id: &RecordId) -> Result<Option<UserRecord>, StoreError> {
        load_by_id(&self.db, id)
    }

    /// Create a record under a previously unused identity.
    ///
    /// The identity is normalized before the uniqueness check, so identities
    /// that differ only by case collide.
    pub fn register(
        &mut self,
        identity: &str,
        display_name: &str,
        secret: &str,
    ) -> Result<UserRecord, StoreError> {
        let identity_key = normalize_identity(identity);
        if load_by_key(&self.db, &identity_key)?.is_some() {
            return Err(StoreError::IdentityExists);
        }

        let salt = credential::generate_salt();
        let digest = credential::derive_digest(secret, &salt);
        let record = UserRecord {
            id: RecordId::generate(),
            identity_key,
            display_name: display_name.to_string(),
            credential_digest: digest,
            credential_salt: salt,
            avatar_ref: None,
            brand: None,
            profile: None,
            personas: Vec::new(),
            activities: ActivityLog::new(),
            progress: Progress::default(),
            last_access: Utc::now(),
        };

        let inserted = self.db.execute(
            "INSERT INTO users (id, identity_key, display_name, credential_digest,
                                credential_salt, avatar_ref, brand_json, profile_json,
                                personas_json, activities_json, progress, last_access)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id.as_str(),
                &record.identity_key,
                &record.display_name,
                &record.credential_digest,
                &record.credential_salt,
                record.avatar_ref.as_deref(),
                encode_optional(record.brand.as_ref())?,
                encode_optional(record.profile.as_ref())?,
                encode_personas(&record.personas)?,
                serde_json::to_string(&record.activities)?,
                i64::from(record.progress.value()),
                record.last_access.to_rfc3339(),
            ],
        );
        if let Err(e) = inserted {
            // The unique index backstops the pre-check when another handle
            // registered the same key between the two statements.
            if is_unique_violation(&e) {
                return Err(StoreError::IdentityExists);
            }
            return Err(e.into());
        }

        tracing::debug!(id = %record.id, "registered new record");
        Ok(record)
    }

    /// Check a secret against the record stored under `identity`.
    ///
    /// A successful check bumps the record's access time before returning
    /// it. Both failure paths derive a digest all the same, so the three
    /// outcomes do not differ in the work performed.
    pub fn validate(
        &mut self,
        identity: &str,
        secret: &str,
    ) -> Result<CredentialCheck, StoreError> {
        let identity_key = normalize_identity(identity);
        let Some(mut record) = load_by_key(&self.db, &identity_key)? else {
            let _ = credential::derive_digest(secret, credential::FALLBACK_SALT);
            return Ok(CredentialCheck::UnknownIdentity);
        };

        let candidate = credential::derive_digest(secret, &record.credential_salt);
        if !credential::digests_match(&candidate, &record.credential_digest) {
            return Ok(CredentialCheck::BadCredential);
        }

        let now = Utc::now();
        self.update(&record.id, UserPatch::new().with_last_access(now))?;
        record.last_access = now;
        Ok(CredentialCheck::Verified(Box::new(record)))
    }

    /// Shallow-merge `patch` into the stored record.
    ///
    /// Read, merge, and write-back run in one transaction, so concurrent
    /// patches to the same record cannot interleave mid-merge. Updating an
    /// id with no record is a no-op.
    pub fn update(&mut self, id: &RecordId, patch: UserPatch) -> Result<(), StoreError> {
        let tx = self.db.transaction()?;
        let Some(mut record) = load_by_id(&tx, id)? else {
            return Ok(());
        };
        record.apply(patch);
        write_record(&tx, &record)?;
        tx.commit()?;
        Ok(())
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.db
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }
}

fn load_by_key(db: &Connection, identity_key: &str) -> Result<Option<UserRecord>, StoreError> {
    let result = db.query_row(
        "SELECT id, identity_key, display_name, credential_digest, credential_salt,
                avatar_ref, brand_json, profile_json, personas_json, activities_json,
                progress, last_access
         FROM users
         WHERE identity_key = ?1",
        [identity_key],
        row_to_record,
    );
    optional_row(result)
}

fn load_by_id(db: &Connection, id: &RecordId) -> Result<Option<UserRecord>, StoreError> {
    let result = db.query_row(
        "SELECT id, identity_key, display_name, credential_digest, credential_salt,
                avatar_ref, brand_json, profile_json, personas_json, activities_json,
                progress, last_access
         FROM users
         WHERE id = ?1",
        [id.as_str()],
        row_to_record,
    );
    optional_row(result)
}

fn optional_row(result: rusqlite::Result<UserRecord>) -> Result<Option<UserRecord>, StoreError> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_record(db: &Connection, record: &UserRecord) -> Result<(), StoreError> {
    db.execute(
        "UPDATE users
         SET display_name = ?2, credential_digest = ?3, credential_salt = ?4,
             avatar_ref = ?5, brand_json = ?6, profile_json = ?7, personas_json = ?8,
             activities_json = ?9, progress = ?10, last_access = ?11
         WHERE id = ?1",
        params![
            record.id.as_str(),
            &record.display_name,
            &record.credential_digest,
            &record.credential_salt,
            record.avatar_ref.as_deref(),
            encode_optional(record.brand.as_ref())?,
            encode_optional(record.profile.as_ref())?,
            encode_personas(&record.personas)?,
            serde_json::to_string(&record.activities)?,
            i64::from(record.progress.value()),
            record.last_access.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn encode_optional<T: Serialize>(value: Option<&T>) -> Result<Option<String>, StoreError> {
    match value {
        Some(inner) => Ok(Some(serde_json::to_string(inner)?)),
        None => Ok(None),
    }
}

fn encode_personas(personas: &[Persona]) -> Result<Option<String>, StoreError> {
    if personas.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(personas)?))
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: RecordId::from(row.get::<_, String>(0)?),
        identity_key: row.get(1)?,
        display_name: row.get(2)?,
        credential_digest: row.get(3)?,
        credential_salt: row.get(4)?,
        avatar_ref: row.get(5)?,
        brand: decode_json(6, row.get(6)?)?,
        profile: decode_json(7, row.get(7)?)?,
        personas: decode_json(8, row.get(8)?)?.unwrap_or_default(),
        activities: decode_json::<ActivityLog>(9, row.get(9)?)?.unwrap_or_default(),
        progress: decode_progress(10, row.get(10)?)?,
        last_access: decode_timestamp(11, &row.get::<_, String>(11)?)?,
    })
}

fn decode_json<T: DeserializeOwned>(idx: usize, json: Option<String>) -> rusqlite::Result<Option<T>> {
    match json {
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
        None => Ok(None),
    }
}

fn decode_progress(idx: usize, raw: i64) -> rusqlite::Result<Progress> {
    u8::try_from(raw)
        .ok()
        .and_then(|value| Progress::new(value).ok())
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Integer,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("progress {raw} out of range"),
                )),
            )
        })
}

fn decode_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
