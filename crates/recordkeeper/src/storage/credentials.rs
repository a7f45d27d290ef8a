//! Flat-file credential store.
//!
//! Each line of the credential file is `username,password,is_active`, with no
//! header. A missing file simply means no accounts exist yet.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::write_atomically;
use crate::error::{Error, Result};

/// Field separator of the credential file.
pub const DELIMITER: char = ',';

/// One login account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Login name, unique ignoring case.
    pub username: String,
    /// Stored password: plaintext, or a digest produced by
    /// [`crate::auth::password`].
    pub password: String,
    /// Inactive accounts are locked and cannot log in.
    pub is_active: bool,
}

impl Credential {
    /// Create an account entry.
    pub fn new(username: impl Into<String>, password: impl Into<String>, is_active: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            is_active,
        }
    }

    /// Parse one line of the credential file.
    ///
    /// Returns `None` unless the line has exactly three fields and the third
    /// is a boolean.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        let [username, password, flag] = fields.as_slice() else {
            return None;
        };
        let is_active = parse_flag(flag)?;
        Some(Self::new(*username, *password, is_active))
    }

    /// Render as a line of the credential file, without the newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.username, self.password, self.is_active
        )
    }

    /// Whether this entry belongs to `username`, ignoring case.
    #[must_use]
    pub fn matches(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
    }
}

/// Parse a boolean flag, ignoring case and surrounding whitespace.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Find the entry for `username`, ignoring case.
#[must_use]
pub fn find<'a>(entries: &'a [Credential], username: &str) -> Option<&'a Credential> {
    entries.iter().find(|entry| entry.matches(username))
}

/// Reads and writes the credential file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether no account has ever been written: the file is missing or has
    /// zero length.
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0)
    }

    /// Load every well-formed entry. Malformed lines, including ones that are
    /// not valid UTF-8, are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(&self) -> Result<Vec<Credential>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(Error::FileRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        for (index, raw) in contents.split(|&b| b == b'\n').enumerate() {
            let Ok(line) = std::str::from_utf8(raw) else {
                warn!(
                    "Skipping line {} in {}: not valid UTF-8",
                    index + 1,
                    self.path.display()
                );
                continue;
            };
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }
            match Credential::parse_line(line) {
                Some(entry) => entries.push(entry),
                None => warn!(
                    "Skipping malformed line {} in {}",
                    index + 1,
                    self.path.display()
                ),
            }
        }

        debug!("Loaded {} accounts from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    /// Overwrite the file with one line per entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, entries: &[Credential]) -> Result<()> {
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&entry.to_line());
            contents.push('\n');
        }
        write_atomically(&self.path, contents.as_bytes())
    }
}
