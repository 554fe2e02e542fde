//! Core domain types for Atelier.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod phase;
pub use phase::{Phase, PhaseStatus, phase_statuses};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifier Types
// ============================================================================

/// Unique identifier of a stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier of one activity feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ActivityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Identity Keys
// ============================================================================

/// Normalize a login identity to its canonical stored form.
///
/// Identity keys compare case-insensitively. Every boundary that accepts a
/// raw identity (registration, login, lookup) must normalize through this
/// one function so the stored form and the probe form always agree.
#[must_use]
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ============================================================================
// Progress
// ============================================================================

/// Journey progress, clamped to `0..=100`.
///
/// Progress is a ratchet: it only ever moves forward. [`Progress::advance_to`]
/// is the sole mutator and refuses to move backward, so a stored value can
/// never regress no matter what a caller asks for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Progress(u8);

#[derive(Debug, Clone, Error)]
#[error("progress must be between 0 and 100 (got {0})")]
pub struct ProgressOutOfRange(pub u8);

impl Progress {
    pub const MAX: Progress = Progress(100);

    /// Constant constructor for statically-known values.
    ///
    /// The bound is checked by the const evaluator, so an out-of-range
    /// constant fails the build instead of the run.
    #[must_use]
    pub const fn at(value: u8) -> Self {
        assert!(value <= 100, "progress constant above 100");
        Self(value)
    }

    pub fn new(value: u8) -> Result<Self, ProgressOutOfRange> {
        if value > 100 {
            Err(ProgressOutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Ratchet toward `candidate`. Returns `true` when the value moved.
    ///
    /// A candidate at or below the current value leaves it untouched.
    pub fn advance_to(&mut self, candidate: Progress) -> bool {
        if candidate.0 > self.0 {
            self.0 = candidate.0;
            true
        } else {
            false
        }
    }
}

impl TryFrom<u8> for Progress {
    type Error = ProgressOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Progress> for u8 {
    fn from(value: Progress) -> Self {
        value.0
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Brand Identity
// ============================================================================

/// Color palette chosen for a brand, with the reasoning behind the picks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub rationale: String,
}

/// Typography pairing for a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typography {
    pub heading: String,
    pub body: String,
    pub style: String,
}

/// A founder's brand identity as produced by the branding flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandIdentity {
    pub name: String,
    pub mission: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_ref: Option<String>,
    pub colors: ColorPalette,
    pub typography: Typography,
}

// ============================================================================
// Founder Profile
// ============================================================================

/// Voice archetype assigned during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Visionary,
    Analyst,
    Rebel,
    Narrator,
}

impl Archetype {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Archetype::Visionary => "visionary",
            Archetype::Analyst => "analyst",
            Archetype::Rebel => "rebel",
            Archetype::Narrator => "narrator",
        }
    }

    /// Parse an archetype from a user-supplied string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visionary" => Some(Archetype::Visionary),
            "analyst" => Some(Archetype::Analyst),
            "rebel" => Some(Archetype::Rebel),
            "narrator" => Some(Archetype::Narrator),
            _ => None,
        }
    }

    /// All assignable archetypes.
    #[must_use]
    pub fn all() -> &'static [Archetype] {
        &[
            Archetype::Visionary,
            Archetype::Analyst,
            Archetype::Rebel,
            Archetype::Narrator,
        ]
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice and positioning profile captured during calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub archetype: Archetype,
    pub tone: Vec<String>,
    pub values: Vec<String>,
    pub expertise: String,
}

// ============================================================================
// Audience Personas
// ============================================================================

/// A synthesized audience persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub demographics: String,
    pub fears: Vec<String>,
    pub desires: Vec<String>,
    pub habits: Vec<String>,
}

// ============================================================================
// Activity History
// ============================================================================

/// Kind of event recorded in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Milestone,
    Content,
    Action,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Milestone => "milestone",
            ActivityKind::Content => "content",
            ActivityKind::Action => "action",
        }
    }
}

/// One entry in a user's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: ActivityId,
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl ActivityItem {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(
        kind: ActivityKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ActivityId::generate(),
            kind,
            title: title.into(),
            description: description.into(),
            timestamp: Utc::now(),
            meta: None,
        }
    }

    /// Attach a free-form annotation (badge text, score delta, etc).
    #[must_use]
    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

/// Bounded, newest-first activity feed.
///
/// Holds at most [`ActivityLog::CAP`] entries. Recording prepends the new
/// entry and drops the oldest overflow, and the cap is re-enforced when a
/// log is deserialized, so the bound holds even for hand-edited data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ActivityItem>", into = "Vec<ActivityItem>")]
pub struct ActivityLog(Vec<ActivityItem>);

impl ActivityLog {
    /// Maximum number of retained entries.
    pub const CAP: usize = 20;

    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an entry at the front, dropping the oldest beyond the cap.
    pub fn record(&mut self, item: ActivityItem) {
        self.0.insert(0, item);
        self.0.truncate(Self::CAP);
    }

    /// Most recent entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&ActivityItem> {
        self.0.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in newest-first order.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityItem> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ActivityItem] {
        &self.0
    }
}

impl From<Vec<ActivityItem>> for ActivityLog {
    fn from(mut items: Vec<ActivityItem>) -> Self {
        items.truncate(Self::CAP);
        Self(items)
    }
}

impl From<ActivityLog> for Vec<ActivityItem> {
    fn from(log: ActivityLog) -> Self {
        log.0
    }
}

// ============================================================================
// Coaching Artifacts
// ============================================================================

/// Kind of a generated daily task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Content,
    Strategy,
    Outreach,
}

/// Urgency of a daily task. Sorting ascending puts the most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

/// One actionable item on the daily coaching list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: TaskKind,
    pub priority: TaskPriority,
    pub completed: bool,
}

/// A positioning gap surfaced by market scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketGap {
    pub niche: String,
    pub opportunity: String,
    pub intent_score: u8,
    pub competition: String,
}

/// Channel a generated content draft targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentChannel {
    Blog,
    Thread,
    Linkedin,
}

impl ContentChannel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentChannel::Blog => "blog",
            ContentChannel::Thread => "thread",
            ContentChannel::Linkedin => "linkedin",
        }
    }
}

/// A generated content draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPiece {
    pub id: String,
    pub title: String,
    pub channel: ContentChannel,
    pub content: String,
}

// ============================================================================
// User Records
// ============================================================================

/// Durable per-user record as held by the record store.
///
/// `identity_key` is stored pre-normalized (see [`normalize_identity`]).
/// Credentials are held as a salted digest, never in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: RecordId,
    pub identity_key: String,
    pub display_name: String,
    pub credential_digest: String,
    pub credential_salt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<Persona>,
    #[serde(default)]
    pub activities: ActivityLog,
    #[serde(default)]
    pub progress: Progress,
    pub last_access: DateTime<Utc>,
}

impl UserRecord {
    /// Overlay `patch` onto this record, field by field.
    ///
    /// Unset patch fields leave the record untouched. Progress moves through
    /// the ratchet, so a patch can never pull it backward.
    pub fn apply(&mut self, patch: UserPatch) {
        let UserPatch {
            display_name,
            avatar_ref,
            brand,
            profile,
            personas,
            activities,
            progress,
            last_access,
        } = patch;
        if let Some(value) = display_name {
            self.display_name = value;
        }
        if let Some(value) = avatar_ref {
            self.avatar_ref = Some(value);
        }
        if let Some(value) = brand {
            self.brand = Some(value);
        }
        if let Some(value) = profile {
            self.profile = Some(value);
        }
        if let Some(value) = personas {
            self.personas = value;
        }
        if let Some(value) = activities {
            self.activities = value;
        }
        if let Some(value) = progress {
            self.progress.advance_to(value);
        }
        if let Some(value) = last_access {
            self.last_access = value;
        }
    }
}

/// Partial update applied to a stored record. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    pub brand: Option<BrandIdentity>,
    pub profile: Option<Profile>,
    pub personas: Option<Vec<Persona>>,
    pub activities: Option<ActivityLog>,
    pub progress: Option<Progress>,
    pub last_access: Option<DateTime<Utc>>,
}

impl UserPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn with_avatar_ref(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar_ref.into());
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: BrandIdentity) -> Self {
        self.brand = Some(brand);
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_personas(mut self, personas: Vec<Persona>) -> Self {
        self.personas = Some(personas);
        self
    }

    #[must_use]
    pub fn with_activities(mut self, activities: ActivityLog) -> Self {
        self.activities = Some(activities);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_last_access(mut self, last_access: DateTime<Utc>) -> Self {
        self.last_access = Some(last_access);
        self
    }

    /// True when the patch carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let Self {
            display_name,
            avatar_ref,
            brand,
            profile,
            personas,
            activities,
            progress,
            last_access,
        } = self;
        display_name.is_none()
            && avatar_ref.is_none()
            && brand.is_none()
            && profile.is_none()
            && personas.is_none()
            && activities.is_none()
            && progress.is_none()
            && last_access.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_brand() -> BrandIdentity {
        BrandIdentity {
            name: "Northwind".to_string(),
            mission: "Charts for people who hate charts".to_string(),
            logo_ref: None,
            colors: ColorPalette {
                primary: "#0B1F3A".to_string(),
                secondary: "#274472".to_string(),
                accent: "#FFB400".to_string(),
                rationale: "Deep navy for trust, amber for energy".to_string(),
            },
            typography: Typography {
                heading: "Space Grotesk".to_string(),
                body: "Inter".to_string(),
                style: "modern".to_string(),
            },
        }
    }

    fn sample_record() -> UserRecord {
        UserRecord {
            id: RecordId::generate(),
            identity_key: "ada@example.com".to_string(),
            display_name: "Ada".to_string(),
            credential_digest: "digest".to_string(),
            credential_salt: "salt".to_string(),
            avatar_ref: None,
            brand: None,
            profile: None,
            personas: Vec::new(),
            activities: ActivityLog::new(),
            progress: Progress::default(),
            last_access: Utc::now(),
        }
    }

    #[test]
    fn record_ids_are_unique() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }

    #[test]
    fn normalize_identity_lowercases_and_trims() {
        assert_eq!(normalize_identity("Ada@Example.COM"), "ada@example.com");
        assert_eq!(normalize_identity("  ada@example.com "), "ada@example.com");
    }

    #[test]
    fn progress_rejects_values_above_one_hundred() {
        assert!(Progress::new(101).is_err());
        assert!(Progress::new(100).is_ok());
        assert!(Progress::new(0).is_ok());
    }

    #[test]
    fn progress_deserialization_enforces_range() {
        assert!(serde_json::from_str::<Progress>("100").is_ok());
        assert!(serde_json::from_str::<Progress>("101").is_err());
    }

    #[test]
    fn progress_advances_forward_only() {
        let mut progress = Progress::new(40).unwrap();
        assert!(progress.advance_to(Progress::new(55).unwrap()));
        assert_eq!(progress.value(), 55);
        assert!(!progress.advance_to(Progress::new(30).unwrap()));
        assert_eq!(progress.value(), 55);
        assert!(!progress.advance_to(Progress::new(55).unwrap()));
        assert_eq!(progress.value(), 55);
    }

    #[test]
    fn archetype_parse_accepts_case_variants() {
        assert_eq!(Archetype::parse("Visionary"), Some(Archetype::Visionary));
        assert_eq!(Archetype::parse(" rebel "), Some(Archetype::Rebel));
        assert_eq!(Archetype::parse("oracle"), None);
    }

    #[test]
    fn archetype_serializes_lowercase() {
        let json = serde_json::to_string(&Archetype::Narrator).unwrap();
        assert_eq!(json, "\"narrator\"");
    }

    #[test]
    fn activity_log_caps_at_twenty_newest_first() {
        let mut log = ActivityLog::new();
        for n in 0..25 {
            log.record(ActivityItem::new(
                ActivityKind::Action,
                format!("step {n}"),
                "did a thing",
            ));
        }
        assert_eq!(log.len(), ActivityLog::CAP);
        assert_eq!(log.latest().unwrap().title, "step 24");
        assert_eq!(log.as_slice().last().unwrap().title, "step 5");
    }

    #[test]
    fn activity_log_reenforces_cap_on_deserialize() {
        let items: Vec<ActivityItem> = (0..30)
            .map(|n| ActivityItem::new(ActivityKind::Milestone, format!("m{n}"), ""))
            .collect();
        let json = serde_json::to_string(&items).unwrap();
        let log: ActivityLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log.len(), ActivityLog::CAP);
        assert_eq!(log.latest().unwrap().title, "m0");
    }

    #[test]
    fn activity_meta_is_optional_on_the_wire() {
        let item = ActivityItem::new(ActivityKind::Content, "draft", "wrote a thread");
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("meta"));

        let tagged = ActivityItem::new(ActivityKind::Milestone, "launch", "").with_meta("+10");
        let json = serde_json::to_string(&tagged).unwrap();
        assert!(json.contains("\"meta\":\"+10\""));
    }

    #[test]
    fn patch_apply_overlays_only_set_fields() {
        let mut record = sample_record();
        let original_name = record.display_name.clone();

        record.apply(UserPatch::new().with_brand(sample_brand()));
        assert_eq!(record.display_name, original_name);
        assert_eq!(record.brand.as_ref().unwrap().name, "Northwind");

        record.apply(UserPatch::new().with_display_name("Ada L."));
        assert_eq!(record.display_name, "Ada L.");
        assert!(
            record.brand.is_some(),
            "unrelated patch must not clear brand"
        );
    }

    #[test]
    fn patch_apply_never_lowers_progress() {
        let mut record = sample_record();
        record.apply(UserPatch::new().with_progress(Progress::new(60).unwrap()));
        assert_eq!(record.progress.value(), 60);

        record.apply(UserPatch::new().with_progress(Progress::new(10).unwrap()));
        assert_eq!(record.progress.value(), 60);
    }

    #[test]
    fn empty_patch_reports_empty() {
        assert!(UserPatch::new().is_empty());
        assert!(!UserPatch::new().with_avatar_ref("a.png").is_empty());
    }

    #[test]
    fn user_record_round_trips_optional_fields() {
        let mut record = sample_record();
        record.brand = Some(sample_brand());
        record.personas = vec![Persona {
            name: "Indie Hacker".to_string(),
            demographics: "25-40, solo founders".to_string(),
            fears: vec!["shipping into silence".to_string()],
            desires: vec!["an audience that converts".to_string()],
            habits: vec!["checks analytics hourly".to_string()],
        }];

        let json = serde_json::to_string(&record).unwrap();
        let decoded: UserRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn legacy_record_without_new_fields_still_loads() {
        // Early records predate avatar/brand/persona columns.
        let json = format!(
            "{{\"id\":\"r1\",\"identity_key\":\"a@b.c\",\"display_name\":\"A\",\
             \"credential_digest\":\"d\",\"credential_salt\":\"s\",\
             \"last_access\":\"{}\"}}",
            Utc::now().to_rfc3339()
        );
        let record: UserRecord = serde_json::from_str(&json).unwrap();
        assert!(record.brand.is_none());
        assert!(record.personas.is_empty());
        assert_eq!(record.progress.value(), 0);
    }
}
