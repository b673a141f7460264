//! Git operations module
//!
//! Provides:
//! - The changeset of a review (modified and added files)
//! - Changeset discovery from a git diff

pub mod diff;

pub use diff::GitDiff;

use anyhow::Result;

/// Files touched by the change under review, as repository paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub modified: Vec<String>,
    pub added: Vec<String>,
}

impl ChangeSet {
    pub fn new(modified: Vec<String>, added: Vec<String>) -> Self {
        Self { modified, added }
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty()
    }
}

/// Source of the modified/added file lists for a review
pub trait ChangeProvider {
    fn changes(&self) -> Result<ChangeSet>;
}

/// A fixed changeset, e.g. passed on the command line
impl ChangeProvider for ChangeSet {
    fn changes(&self) -> Result<ChangeSet> {
        Ok(self.clone())
    }
}
