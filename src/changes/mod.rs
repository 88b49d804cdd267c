//! Changed-line sets derived from `git diff` output.
//!
//! Two sources are supported:
//!
//! - [`parse_numstat`] reads `git diff --numstat` and treats an added count of
//!   `n` as lines `1..=n` of the file. This is an approximation: the lines are
//!   not the real positions of the changes.
//! - [`parse_unified`] reads `git diff -U0` and takes the new-side line
//!   numbers from each hunk header.

use std::collections::BTreeSet;

mod hunk;
mod numstat;

pub use hunk::{HunkRange, parse_hunk_header, parse_unified};
pub use numstat::parse_numstat;

/// Lines considered changed in a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChanges {
    /// Path as reported by git, relative to the repository root
    pub path: String,
    pub lines: BTreeSet<u32>,
}

/// Changed lines per file, in the order git reported the files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub files: Vec<FileChanges>,
}

impl ChangeSet {
    /// Set the changed lines for `path`, replacing any previous entry
    pub fn insert(&mut self, path: &str, lines: BTreeSet<u32>) {
        *self.lines_mut(path) = lines;
    }

    /// Changed lines for `path`, creating an empty entry if it is not present
    pub fn lines_mut(&mut self, path: &str) -> &mut BTreeSet<u32> {
        let idx = match self.files.iter().position(|f| f.path == path) {
            Some(idx) => idx,
            None => {
                self.files.push(FileChanges {
                    path: path.to_string(),
                    lines: BTreeSet::new(),
                });
                self.files.len() - 1
            }
        };
        &mut self.files[idx].lines
    }

    pub fn get(&self, path: &str) -> Option<&BTreeSet<u32>> {
        self.files.iter().find(|f| f.path == path).map(|f| &f.lines)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileChanges> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
