//! The authenticated user's working state.

use crate::editor::RecordBook;
use crate::storage::RecordLoad;

/// Authenticated user plus the in-memory record book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: String,
    book: RecordBook,
    lossy_load: bool,
    dirty: bool,
}

impl Session {
    /// Start a session for `user` over the result of a record load.
    #[must_use]
    pub fn new(user: impl Into<String>, load: RecordLoad) -> Self {
        let lossy_load = load.is_lossy();
        Self {
            user: user.into(),
            book: RecordBook::new(load.into_people()),
            lossy_load,
            dirty: false,
        }
    }

    /// Name of the signed-in user.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The record book.
    #[must_use]
    pub fn book(&self) -> &RecordBook {
        &self.book
    }

    /// Mutable access to the record book. Callers that change it should
    /// also call [`mark_dirty`](Self::mark_dirty).
    pub fn book_mut(&mut self) -> &mut RecordBook {
        &mut self.book
    }

    /// Note that the book has unsaved edits.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Note that the book now matches the record file.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.lossy_load = false;
    }

    /// Whether the book has edits not yet written.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether leaving the session should write the book back.
    ///
    /// After a lossy load the file on disk holds data the book does not, so
    /// it is only overwritten once the user has changed something.
    #[must_use]
    pub fn should_save_on_exit(&self) -> bool {
        !self.lossy_load || self.dirty
    }
}
