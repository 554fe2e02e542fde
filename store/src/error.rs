use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity already registered")]
    IdentityExists,
    #[error("failed to prepare store path {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record store failure: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("stored record could not be encoded or decoded: {0}")]
    Encoding(#[from] serde_json::Error),
}
