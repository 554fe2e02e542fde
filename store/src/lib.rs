//! Durable user records for Atelier
//!
//! This crate owns the on-disk truth: per-user records in a SQLite database
//! with hardened file permissions. It provides:
//! - Registration and credential validation against salted digests
//! - Identity lookup with case-insensitive keys
//! - Shallow record patching, used by session autosave

mod credential;
mod db_path;
mod error;
mod records;

pub use error::StoreError;
pub use records::{CredentialCheck, RecordStore};
