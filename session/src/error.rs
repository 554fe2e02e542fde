use atelier_store::StoreError;
use thiserror::Error;

/// Why a login or registration attempt was refused.
///
/// Display strings are the short, user-facing reasons; the cli prints them
/// verbatim. Mutators never produce these: without an active session they
/// are silent no-ops.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No record exists under the given identity.
    #[error("no account found for this identity")]
    UnknownIdentity,
    /// The identity exists but the secret did not match.
    #[error("that credential does not match")]
    BadCredential,
    /// Registration collided with an existing identity.
    #[error("this identity is already registered")]
    IdentityExists,
    /// The record store could not complete the call.
    #[error("record store unavailable: {0}")]
    Transient(String),
}

impl AuthError {
    /// Map a store failure onto the auth taxonomy.
    ///
    /// `IdentityExists` keeps its own reason; everything else is transient
    /// from the caller's point of view.
    #[must_use]
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::IdentityExists => AuthError::IdentityExists,
            other => AuthError::Transient(other.to_string()),
        }
    }
}
