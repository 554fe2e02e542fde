//! Session lifecycle and field mutators.
//!
//! The manager owns the record store, the pointer file path, and the active
//! session. Every mutator updates the in-memory session first and then
//! checkpoints the change to the store on the blocking pool. In-memory state
//! is authoritative for the running process; a failed checkpoint is logged
//! and never rolled back.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use atelier_store::{CredentialCheck, RecordStore, StoreError};
use atelier_types::{
    ActivityItem, ActivityKind, BrandIdentity, Persona, PhaseStatus, Profile, Progress, RecordId,
    UserPatch, UserRecord,
};

use crate::config::DataDir;
use crate::error::AuthError;
use crate::pointer::SessionPointer;
use crate::session::Session;

/// Filename of the record database inside the data directory.
pub const DB_FILENAME: &str = "records.db";

/// Progress floor granted when brand setup completes.
pub const BRAND_PROGRESS_FLOOR: Progress = Progress::at(25);

/// Progress floor granted when voice calibration completes.
pub const PROFILE_PROGRESS_FLOOR: Progress = Progress::at(10);

/// What [`SessionManager::bootstrap`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A previous session was restored from the pointer file.
    Restored,
    /// No restorable session was found.
    Empty,
}

/// Owned session context: store handle, pointer path, active session.
///
/// Mutators take `&mut self`, so one manager serializes its own calls; the
/// store lock additionally serializes against any other handle to the same
/// database.
pub struct SessionManager {
    store: Arc<Mutex<RecordStore>>,
    pointer_path: PathBuf,
    session: Option<Session>,
    initialized: bool,
}

impl SessionManager {
    /// Open the manager over the given data directory.
    ///
    /// The record database and the pointer file both live under it.
    pub fn open(data_dir: &DataDir) -> Result<Self, StoreError> {
        let store = RecordStore::open(data_dir.join(DB_FILENAME))?;
        Ok(Self::with_store(
            store,
            data_dir.join(SessionPointer::FILENAME),
        ))
    }

    /// Wrap an already-open store. Used with in-memory stores in tests.
    #[must_use]
    pub fn with_store(store: RecordStore, pointer_path: PathBuf) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            pointer_path,
            session: None,
            initialized: false,
        }
    }

    /// Restore the previously active session, once.
    ///
    /// Reads the pointer file and resolves its identity against the store.
    /// The first call decides; later calls re-read nothing and report the
    /// standing outcome. Pointer or store failures log and yield `Empty`.
    pub async fn bootstrap(&mut self) -> BootstrapOutcome {
        if self.initialized {
            return if self.session.is_some() {
                BootstrapOutcome::Restored
            } else {
                BootstrapOutcome::Empty
            };
        }
        self.initialized = true;

        let Some(pointer) = SessionPointer::load(&self.pointer_path) else {
            return BootstrapOutcome::Empty;
        };

        let identity = pointer.identity_key;
        match self
            .run_store(move |store| store.find_by_identity(&identity))
            .await
        {
            Ok(Some(record)) => {
                tracing::debug!(id = %record.id, "restored previous session");
                self.session = Some(Session::from_record(record));
                BootstrapOutcome::Restored
            }
            Ok(None) => {
                // Pointer outlived its record; drop it.
                if let Err(e) = SessionPointer::remove(&self.pointer_path) {
                    tracing::warn!("Failed to remove stale session pointer: {e}");
                }
                BootstrapOutcome::Empty
            }
            Err(e) => {
                tracing::warn!("Session restore failed: {e}");
                BootstrapOutcome::Empty
            }
        }
    }

    /// Sign in against a stored record.
    pub async fn login(&mut self, identity: &str, secret: &str) -> Result<(), AuthError> {
        let identity = identity.to_string();
        let secret = secret.to_string();
        let check = self
            .run_store(move |store| store.validate(&identity, &secret))
            .await?;

        match check {
            CredentialCheck::Verified(record) => {
                self.install_session(*record);
                Ok(())
            }
            CredentialCheck::UnknownIdentity => Err(AuthError::UnknownIdentity),
            CredentialCheck::BadCredential => Err(AuthError::BadCredential),
        }
    }

    /// Create a record and sign in as it.
    pub async fn register(
        &mut self,
        identity: &str,
        display_name: &str,
        secret: &str,
    ) -> Result<(), AuthError> {
        let identity = identity.to_string();
        let display_name = display_name.to_string();
        let secret = secret.to_string();
        let record = self
            .run_store(move |store| store.register(&identity, &display_name, &secret))
            .await?;

        self.install_session(record);
        Ok(())
    }

    /// Clear the active session and drop the pointer file. Idempotent.
    pub fn logout(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("session closed");
        }
        if let Err(e) = SessionPointer::remove(&self.pointer_path) {
            tracing::warn!("Failed to remove session pointer: {e}");
        }
    }

    /// Replace the brand and ratchet progress to the brand floor.
    pub async fn set_brand(&mut self, brand: BrandIdentity) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("set_brand without an active session");
            return;
        };
        session.brand = Some(brand.clone());
        session.progress.advance_to(BRAND_PROGRESS_FLOOR);
        let id = session.id.clone();
        let patch = UserPatch::new()
            .with_brand(brand)
            .with_progress(session.progress);
        self.persist(id, patch).await;
    }

    /// Set the logo on the existing brand. Without a brand this does nothing.
    pub async fn patch_brand_logo(&mut self, logo_ref: impl Into<String>) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("patch_brand_logo without an active session");
            return;
        };
        let Some(brand) = session.brand.as_mut() else {
            tracing::debug!("patch_brand_logo without a brand");
            return;
        };
        brand.logo_ref = Some(logo_ref.into());
        let id = session.id.clone();
        let patch = UserPatch::new().with_brand(brand.clone());
        self.persist(id, patch).await;
    }

    /// Replace the profile and ratchet progress to the profile floor.
    pub async fn set_profile(&mut self, profile: Profile) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("set_profile without an active session");
            return;
        };
        session.profile = Some(profile.clone());
        session.progress.advance_to(PROFILE_PROGRESS_FLOOR);
        let id = session.id.clone();
        let patch = UserPatch::new()
            .with_profile(profile)
            .with_progress(session.progress);
        self.persist(id, patch).await;
    }

    /// Replace the persona set wholesale.
    pub async fn set_personas(&mut self, personas: Vec<Persona>) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("set_personas without an active session");
            return;
        };
        session.personas = personas.clone();
        let id = session.id.clone();
        let patch = UserPatch::new().with_personas(personas);
        self.persist(id, patch).await;
    }

    /// Update the display name, and the avatar when one is given.
    pub async fn set_user_info(
        &mut self,
        display_name: impl Into<String>,
        avatar_ref: Option<String>,
    ) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("set_user_info without an active session");
            return;
        };
        session.display_name = display_name.into();
        let mut patch = UserPatch::new().with_display_name(session.display_name.clone());
        if let Some(avatar_ref) = avatar_ref {
            session.avatar_ref = Some(avatar_ref.clone());
            patch = patch.with_avatar_ref(avatar_ref);
        }
        let id = session.id.clone();
        self.persist(id, patch).await;
    }

    /// Ratchet progress toward `candidate`.
    ///
    /// When the ratchet does not move, nothing is written.
    pub async fn bump_progress(&mut self, candidate: Progress) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("bump_progress without an active session");
            return;
        };
        if !session.progress.advance_to(candidate) {
            tracing::debug!("progress unchanged at {}", session.progress);
            return;
        }
        let id = session.id.clone();
        let patch = UserPatch::new().with_progress(session.progress);
        self.persist(id, patch).await;
    }

    /// Record an activity entry and persist the updated feed.
    pub async fn append_activity(
        &mut self,
        kind: ActivityKind,
        title: impl Into<String>,
        description: impl Into<String>,
        meta: Option<String>,
    ) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("append_activity without an active session");
            return;
        };
        let mut item = ActivityItem::new(kind, title, description);
        if let Some(meta) = meta {
            item = item.with_meta(meta);
        }
        session.activities.record(item);
        let id = session.id.clone();
        let patch = UserPatch::new().with_activities(session.activities.clone());
        self.persist(id, patch).await;
    }

    /// The active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// True once `bootstrap` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Phase gate projection for the active session, if any.
    #[must_use]
    pub fn phase_statuses(&self) -> Option<[PhaseStatus; 4]> {
        self.session.as_ref().map(Session::phase_statuses)
    }

    fn install_session(&mut self, record: UserRecord) {
        let pointer = SessionPointer::new(record.identity_key.clone());
        if let Err(e) = pointer.save(&self.pointer_path) {
            tracing::warn!("Failed to write session pointer: {e}");
        }
        tracing::debug!(id = %record.id, "session installed");
        self.session = Some(Session::from_record(record));
    }

    /// Durably checkpoint a patch for the active record.
    ///
    /// Failures are logged and swallowed; the in-memory session stays as
    /// already updated.
    async fn persist(&self, id: RecordId, patch: UserPatch) {
        if let Err(e) = self.run_store(move |store| store.update(&id, patch)).await {
            tracing::warn!("Durable write failed: {e}");
        }
    }

    /// Run one store call on the blocking pool.
    async fn run_store<T, F>(&self, op: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(&mut RecordStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|e| AuthError::Transient(format!("store lock poisoned: {e}")))?;
            op(&mut *guard).map_err(AuthError::from_store)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => Err(AuthError::Transient(format!("store task failed: {e}"))),
        }
    }
}
