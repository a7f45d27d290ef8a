//! CSV-backed record store.
//!
//! The record file starts with the header row
//! `Id,FirstName,LastName,Phone,City,Balance` followed by one row per person.
//! Loading never fails on bad content: the outcome is reported as a
//! [`RecordLoad`] variant and bad rows are skipped with a warning.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::write_atomically;
use crate::error::{Error, Result};
use crate::person::Person;

/// Header row of the record file, in column order.
pub const RECORD_HEADER: [&str; 6] = ["Id", "FirstName", "LastName", "Phone", "City", "Balance"];

/// Outcome of loading the record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLoad {
    /// The file was missing or blank and has been written with just the header.
    Initialized,
    /// The file holds a header and no data rows.
    Empty,
    /// Data rows were read in file order.
    Parsed {
        /// Records that parsed cleanly.
        people: Vec<Person>,
        /// Rows that were skipped because they did not parse.
        skipped: usize,
    },
    /// The header or the file structure is unusable. The file is left as is.
    Malformed {
        /// What was wrong with the file.
        reason: String,
    },
}

impl RecordLoad {
    /// The records available to this session.
    #[must_use]
    pub fn into_people(self) -> Vec<Person> {
        match self {
            Self::Parsed { people, .. } => people,
            Self::Initialized | Self::Empty | Self::Malformed { .. } => Vec::new(),
        }
    }

    /// Whether the file holds data that the loaded list does not show.
    #[must_use]
    pub fn is_lossy(&self) -> bool {
        match self {
            Self::Malformed { .. } => true,
            Self::Parsed { skipped, .. } => *skipped > 0,
            Self::Initialized | Self::Empty => false,
        }
    }
}

/// Reads and writes the person record file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store for the file at `path`. Nothing is touched until
    /// [`load`](Self::load) or [`save`](Self::save).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records.
    ///
    /// A missing or blank file is (re)written with the header row. A file
    /// with a wrong header is reported as [`RecordLoad::Malformed`] and not
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or if the
    /// header cannot be written.
    pub fn load(&self) -> Result<RecordLoad> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.save(&[])?;
                info!("Created record file {}", self.path.display());
                return Ok(RecordLoad::Initialized);
            }
            Err(source) => {
                return Err(Error::FileRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            self.save(&[])?;
            info!("Record file {} was empty; header written", self.path.display());
            return Ok(RecordLoad::Initialized);
        }

        Ok(self.parse(&contents))
    }

    fn parse(&self, contents: &[u8]) -> RecordLoad {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(contents);

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                warn!("Error reading CSV file {}: {e}", self.path.display());
                return RecordLoad::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        if !headers.iter().eq(RECORD_HEADER) {
            warn!(
                "CSV header validation error in {}. Ensure the file has correct headers or is not corrupted.",
                self.path.display()
            );
            return RecordLoad::Malformed {
                reason: format!(
                    "expected header {:?}, found {:?}",
                    RECORD_HEADER.join(","),
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            };
        }

        let mut people = Vec::new();
        let mut skipped = 0;
        for row in reader.deserialize::<Person>() {
            match row {
                Ok(person) => people.push(person),
                Err(e) => {
                    skipped += 1;
                    let line = e.position().map_or(0, csv::Position::line);
                    warn!(
                        "Skipping malformed row in {} at line {line}: {e}",
                        self.path.display()
                    );
                }
            }
        }

        if people.is_empty() && skipped == 0 {
            return RecordLoad::Empty;
        }

        debug!(
            "Loaded {} records from {} ({skipped} skipped)",
            people.len(),
            self.path.display()
        );
        RecordLoad::Parsed { people, skipped }
    }

    /// Overwrite the file with the header and one row per record.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails. The previous file
    /// contents survive a failed write.
    pub fn save(&self, people: &[Person]) -> Result<()> {
        let csv_error = |source: csv::Error| Error::Csv {
            path: self.path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(RECORD_HEADER).map_err(csv_error)?;
        for person in people {
            writer.serialize(person).map_err(csv_error)?;
        }

        let bytes = writer.into_inner().map_err(|e| Error::FileWrite {
            path: self.path.clone(),
            source: e.into_error(),
        })?;

        write_atomically(&self.path, &bytes)
    }
}
