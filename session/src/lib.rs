//! Session lifecycle for Atelier.
//!
//! This crate owns everything between "the process started" and "a signed-in
//! user is mutating their record":
//!
//! - [`DataDir`]: where the record database and pointer file live
//! - [`SessionPointer`]: the small JSON file that survives restarts
//! - [`Session`]: the in-memory projection of the signed-in user
//! - [`SessionManager`]: bootstrap, login, register, logout, and the
//!   memory-first field mutators
//!
//! The manager applies every change to the in-memory session first and then
//! checkpoints it to the record store. The in-memory state is authoritative
//! for the running process; a failed checkpoint is logged, not rolled back.

mod config;
mod error;
mod manager;
mod pointer;
mod session;

pub use config::{DataDir, DataDirSource};
pub use error::AuthError;
pub use manager::{
    BRAND_PROGRESS_FLOOR, BootstrapOutcome, DB_FILENAME, PROFILE_PROGRESS_FLOOR, SessionManager,
};
pub use pointer::SessionPointer;
pub use session::Session;
