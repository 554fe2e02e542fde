//! Data directory resolution.

use std::path::PathBuf;

/// Where the resolved data directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirSource {
    /// Explicit path, from `ATELIER_DATA_DIR` or a caller override.
    Custom,
    /// Platform-local data directory.
    System,
    /// Relative fallback when the platform reports no data directory.
    Fallback,
}

/// Resolved data directory with its provenance.
///
/// Callers that care (the cli does) can tell the user when a fallback
/// directory is in use instead of silently scattering files.
#[derive(Debug, Clone)]
pub struct DataDir {
    pub path: PathBuf,
    pub source: DataDirSource,
}

impl DataDir {
    /// Resolve the Atelier data directory.
    ///
    /// `ATELIER_DATA_DIR` wins when set. Otherwise the platform-local data
    /// directory, and as a last resort a directory relative to the working
    /// directory.
    #[must_use]
    pub fn resolve() -> Self {
        if let Some(path) = std::env::var_os("ATELIER_DATA_DIR") {
            return Self {
                path: PathBuf::from(path),
                source: DataDirSource::Custom,
            };
        }
        match dirs::data_local_dir() {
            Some(path) => Self {
                path: path.join("atelier"),
                source: DataDirSource::System,
            },
            None => Self {
                path: PathBuf::from(".").join("atelier"),
                source: DataDirSource::Fallback,
            },
        }
    }

    /// Wrap an explicit directory (tests, overrides).
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: DataDirSource::Custom,
        }
    }

    #[must_use]
    pub fn join(&self, child: &str) -> PathBuf {
        self.path.join(child)
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DataDirSource::Fallback)
    }
}
