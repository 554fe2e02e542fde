//! Filesystem hardening for the records database.
//!
//! Records hold credential digests, so the database directory and files are
//! restricted to the owning user before SQLite ever touches them.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::StoreError;

fn prepare_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Prepare {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn ensure_secure_dir(path: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(path).map_err(|source| prepare_error(path, source))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let metadata = std::fs::metadata(path).map_err(|source| prepare_error(path, source))?;

        // Only tighten modes on directories we own.
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Ok(());
        }

        let current_mode = metadata.permissions().mode() & 0o777;
        if current_mode & 0o077 != 0 {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
                .map_err(|source| prepare_error(path, source))?;
        }
    }
    Ok(())
}

pub(crate) fn ensure_secure_db_files(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;

            let _file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .mode(0o600)
                .open(path)
                .map_err(|source| prepare_error(path, source))?;
        }
        #[cfg(not(unix))]
        {
            let _file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(path)
                .map_err(|source| prepare_error(path, source))?;
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|source| prepare_error(path, source))?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = sqlite_sidecar_path(path, suffix);
            if sidecar.exists() {
                let _ = std::fs::set_permissions(&sidecar, std::fs::Permissions::from_mode(0o600));
            }
        }
    }

    Ok(())
}

pub(crate) fn prepare_db_path(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        ensure_secure_dir(parent)?;
    }
    ensure_secure_db_files(path)
}

#[cfg(unix)]
fn sqlite_sidecar_path(path: &Path, suffix: &str) -> std::path::PathBuf {
    let file_name = path.file_name().map(|name| name.to_string_lossy());
    match file_name {
        Some(name) => path.with_file_name(format!("{name}{suffix}")),
        None => std::path::PathBuf::from(format!("{}{suffix}", path.display())),
    }
}
