//! Lesson playlists
//!
//! A playlist is an ordered list of named chapters, each one a position or
//! move-set authored by the syllabus service. Chapters are immutable once
//! loaded; stepping off either end of the list is a no-op, not an error.

use serde::{Deserialize, Serialize};

/// One named position/move-set unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    /// Placement string or numbered move text, stored verbatim
    pub source: String,
}

/// An ordered chapter list with a current index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    chapters: Vec<Chapter>,
    current: usize,
}

impl Playlist {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Playlist {
            chapters,
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapters.get(self.current)
    }

    /// Select a chapter; out-of-range indices leave the selection alone
    pub fn select(&mut self, index: usize) -> Option<&Chapter> {
        if index < self.chapters.len() {
            self.current = index;
            self.chapters.get(index)
        } else {
            None
        }
    }

    /// Advance one chapter; a no-op at the end of the list
    pub fn next(&mut self) -> Option<&Chapter> {
        if self.current + 1 < self.chapters.len() {
            self.current += 1;
            self.chapters.get(self.current)
        } else {
            None
        }
    }

    /// Step back one chapter; a no-op at the start of the list
    pub fn previous(&mut self) -> Option<&Chapter> {
        if self.current > 0 {
            self.current -= 1;
            self.chapters.get(self.current)
        } else {
            None
        }
    }
}
