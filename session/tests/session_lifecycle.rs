//! Session lifecycle across process restarts.
//!
//! Each test drives a manager over a temporary data directory, drops it to
//! simulate process exit, and opens a fresh one to check what survives.

use std::path::Path;

use atelier_session::{
    AuthError, BootstrapOutcome, DB_FILENAME, DataDir, SessionManager, SessionPointer,
};
use atelier_store::RecordStore;
use atelier_types::{
    Archetype, BrandIdentity, ColorPalette, Persona, Profile, Progress, Typography,
};

fn manager_in(dir: &Path) -> SessionManager {
    SessionManager::open(&DataDir::at(dir)).expect("open manager")
}

fn sample_brand() -> BrandIdentity {
    BrandIdentity {
        name: "Terracotta".to_string(),
        mission: "Hand-thrown software".to_string(),
        logo_ref: None,
        colors: ColorPalette {
            primary: "#9C4A1A".to_string(),
            secondary: "#D96C06".to_string(),
            accent: "#FFF3E2".to_string(),
            rationale: "Clay tones, kiln-warm accent".to_string(),
        },
        typography: Typography {
            heading: "Recoleta".to_string(),
            body: "Mulish".to_string(),
            style: "crafted".to_string(),
        },
    }
}

fn sample_profile() -> Profile {
    Profile {
        archetype: Archetype::Visionary,
        tone: vec!["bold".to_string()],
        values: vec!["honesty".to_string(), "momentum".to_string()],
        expertise: "bootstrapped SaaS".to_string(),
    }
}

#[tokio::test]
async fn a_registered_user_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let mut manager = manager_in(dir.path());
        manager
            .register("ada@example.com", "Ada", "hunter2")
            .await
            .expect("register");
        manager.set_brand(sample_brand()).await;
        manager.bump_progress(Progress::at(40)).await;
    }

    let mut restarted = manager_in(dir.path());
    assert!(!restarted.is_initialized());
    assert_eq!(restarted.bootstrap().await, BootstrapOutcome::Restored);
    assert!(restarted.is_initialized());

    let session = restarted.session().expect("restored session");
    assert_eq!(session.identity_key, "ada@example.com");
    assert_eq!(session.display_name, "Ada");
    assert_eq!(session.progress.value(), 40);
    assert_eq!(
        session.brand.as_ref().map(|brand| brand.name.as_str()),
        Some("Terracotta")
    );
}

#[tokio::test]
async fn logout_removes_restorability() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let mut manager = manager_in(dir.path());
        manager
            .register("ada@example.com", "Ada", "hunter2")
            .await
            .expect("register");
        manager.logout();
        manager.logout();
    }

    let mut restarted = manager_in(dir.path());
    assert_eq!(restarted.bootstrap().await, BootstrapOutcome::Empty);
    assert!(restarted.session().is_none());
}

#[tokio::test]
async fn stale_pointer_bootstraps_empty_and_is_cleaned_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pointer_path = dir.path().join(SessionPointer::FILENAME);
    SessionPointer::new("ghost@example.com")
        .save(&pointer_path)
        .expect("write stale pointer");

    let mut manager = manager_in(dir.path());
    assert_eq!(manager.bootstrap().await, BootstrapOutcome::Empty);
    assert!(manager.session().is_none());
    assert!(!pointer_path.exists(), "stale pointer should be removed");
}

#[tokio::test]
async fn bootstrap_decides_once() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let mut manager = manager_in(dir.path());
        manager
            .register("ada@example.com", "Ada", "hunter2")
            .await
            .expect("register");
    }

    let mut restarted = manager_in(dir.path());
    assert_eq!(restarted.bootstrap().await, BootstrapOutcome::Restored);

    // Later calls report the standing outcome without re-reading the disk.
    std::fs::remove_file(dir.path().join(SessionPointer::FILENAME)).expect("remove pointer");
    assert_eq!(restarted.bootstrap().await, BootstrapOutcome::Restored);
    assert!(restarted.session().is_some());
}

#[tokio::test]
async fn checkpoints_are_visible_to_a_fresh_store_handle() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut manager = manager_in(dir.path());
    manager
        .register("ada@example.com", "Ada", "hunter2")
        .await
        .expect("register");
    manager.set_profile(sample_profile()).await;
    manager
        .set_personas(vec![Persona {
            name: "Side-project Sam".to_string(),
            demographics: "evenings-and-weekends builder".to_string(),
            fears: vec!["launching to nobody".to_string()],
            desires: vec!["first paying user".to_string()],
            habits: vec!["ships on Sundays".to_string()],
        }])
        .await;
    manager
        .set_user_info("Ada Lovelace", Some("portrait.png".to_string()))
        .await;

    let store = RecordStore::open(dir.path().join(DB_FILENAME)).expect("open fresh store");
    let record = store
        .find_by_identity("ada@example.com")
        .expect("find")
        .expect("record");
    assert_eq!(record.display_name, "Ada Lovelace");
    assert_eq!(record.avatar_ref.as_deref(), Some("portrait.png"));
    assert_eq!(record.progress.value(), 10);
    assert_eq!(record.personas.len(), 1);
    assert_eq!(record.personas[0].name, "Side-project Sam");
    assert_eq!(
        record.profile.expect("profile").archetype,
        Archetype::Visionary
    );
}

#[tokio::test]
async fn case_and_whitespace_variants_reach_the_same_account() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut manager = manager_in(dir.path());
    manager
        .register("Ada@Example.COM", "Ada", "hunter2")
        .await
        .expect("register");

    let pointer = SessionPointer::load(&dir.path().join(SessionPointer::FILENAME))
        .expect("pointer written");
    assert_eq!(pointer.identity_key, "ada@example.com");

    manager.logout();
    manager
        .login(" ada@example.com ", "hunter2")
        .await
        .expect("login with variant spelling");

    let collision = manager.register("ADA@EXAMPLE.COM", "Else", "pw").await;
    assert!(matches!(collision, Err(AuthError::IdentityExists)));
}
