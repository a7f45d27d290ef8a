//! Storage layer for recordkeeper.
//!
//! Two flat files back the application: the CSV record file
//! ([`RecordStore`]) and the credential file ([`CredentialStore`]). Both are
//! read and written wholesale. Writes go to a sibling temporary file that is
//! then renamed over the target, so a failed save never leaves a truncated
//! file behind.

pub mod credentials;
pub mod records;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub use credentials::{Credential, CredentialStore};
pub use records::{RecordLoad, RecordStore, RECORD_HEADER};

/// Replace `path` with `contents`.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;

    let staging = staging_path(path);
    fs::write(&staging, contents).map_err(|source| Error::FileWrite {
        path: staging.clone(),
        source,
    })?;

    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(Error::FileWrite {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("data"));
    name.push(".tmp");
    path.with_file_name(name)
}
