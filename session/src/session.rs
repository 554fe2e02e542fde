//! In-memory projection of the signed-in user.

use atelier_types::{
    ActivityLog, BrandIdentity, Persona, PhaseStatus, Profile, Progress, RecordId, UserRecord,
    phase_statuses,
};

/// The signed-in user's state, denormalized from the stored record.
///
/// At most one session is active per manager. A session always corresponded
/// to an existing record when it was built; mutators do not re-check that
/// the record is still there (a vanished record makes the durable write a
/// no-op, last write wins).
#[derive(Debug, Clone)]
pub struct Session {
    pub id: RecordId,
    pub identity_key: String,
    pub display_name: String,
    pub avatar_ref: Option<String>,
    pub brand: Option<BrandIdentity>,
    pub profile: Option<Profile>,
    pub personas: Vec<Persona>,
    pub activities: ActivityLog,
    pub progress: Progress,
}

impl Session {
    pub(crate) fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            identity_key: record.identity_key,
            display_name: record.display_name,
            avatar_ref: record.avatar_ref,
            brand: record.brand,
            profile: record.profile,
            personas: record.personas,
            activities: record.activities,
            progress: record.progress,
        }
    }

    /// Phase gate projection at this session's progress.
    #[must_use]
    pub fn phase_statuses(&self) -> [PhaseStatus; 4] {
        phase_statuses(self.progress)
    }
}
