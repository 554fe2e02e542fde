//! Active-session pointer file.
//!
//! A small JSON file in the data directory records which identity was signed
//! in when the process last ran. It lives beside the record database, not
//! inside it, so bootstrap can read it with plain file IO. Absent file means
//! no restorable session.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// On-disk pointer to the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPointer {
    /// Normalized identity key of the signed-in user.
    pub identity_key: String,

    /// Schema version for forward compatibility.
    ///
    /// A pointer written by a newer schema is ignored rather than guessed at.
    pub version: u32,
}

impl SessionPointer {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Filename for the pointer file.
    pub const FILENAME: &'static str = "active_session.json";

    /// Create a pointer for the given identity with the current version.
    #[must_use]
    pub fn new(identity_key: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            version: Self::CURRENT_VERSION,
        }
    }

    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }

    /// Load the pointer at `path`.
    ///
    /// Missing, unreadable, unparseable, and incompatible files all read as
    /// `None`; the failure modes beyond "missing" are logged.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<Self>(&data) {
                Ok(pointer) if pointer.is_compatible() => Some(pointer),
                Ok(_) => {
                    tracing::debug!("Session pointer version mismatch, ignoring");
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to parse session pointer: {e}");
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read session pointer: {e}");
                None
            }
        }
    }

    /// Write the pointer atomically with owner-only permissions.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// Remove the pointer file. A missing file is not an error.
    pub fn remove(path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// Temp file + rename in the destination directory, so a crash mid-write
// never leaves a torn pointer behind.
fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }

    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SessionPointer;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SessionPointer::FILENAME);

        let pointer = SessionPointer::new("ada@example.com");
        pointer.save(&path).expect("save");

        let loaded = SessionPointer::load(&path).expect("pointer present");
        assert_eq!(loaded, pointer);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(SessionPointer::load(&dir.path().join("absent.json")).is_none());
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SessionPointer::FILENAME);
        std::fs::write(&path, b"{not json").expect("write garbage");
        assert!(SessionPointer::load(&path).is_none());
    }

    #[test]
    fn future_version_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SessionPointer::FILENAME);
        let ahead = SessionPointer {
            identity_key: "ada@example.com".to_string(),
            version: SessionPointer::CURRENT_VERSION + 1,
        };
        ahead.save(&path).expect("save");
        assert!(SessionPointer::load(&path).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SessionPointer::FILENAME);

        SessionPointer::new("ada@example.com")
            .save(&path)
            .expect("save");
        SessionPointer::remove(&path).expect("first remove");
        assert!(!path.exists());
        SessionPointer::remove(&path).expect("second remove");
    }

    #[cfg(unix)]
    #[test]
    fn pointer_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SessionPointer::FILENAME);
        SessionPointer::new("ada@example.com")
            .save(&path)
            .expect("save");

        let mode = std::fs::metadata(&path)
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }
}
