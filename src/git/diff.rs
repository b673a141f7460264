//! Git diff parsing for changeset detection

use anyhow::{Context, Result};
use git2::{Delta, Diff, DiffOptions, Repository, Tree};
use std::path::Path;

use super::{ChangeProvider, ChangeSet};

/// Git diff operations
pub struct GitDiff {
    repo: Repository,
    base: Option<String>,
    include_uncommitted: bool,
}

impl GitDiff {
    /// Open a repository at the given path
    ///
    /// With a `base` reference the changeset runs from the merge base of
    /// `base` and HEAD; without one it is the uncommitted work.
    pub fn new(path: &Path, base: Option<&str>, include_uncommitted: bool) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to find git repository at {}", path.display()))?;

        Ok(Self {
            repo,
            base: base.map(|b| b.to_string()),
            include_uncommitted: include_uncommitted || base.is_none(),
        })
    }

    /// Tree the changeset is measured against
    fn base_tree(&self) -> Result<Tree<'_>> {
        let head = self.repo.head()?.peel_to_commit()?;

        let Some(ref base) = self.base else {
            return Ok(head.tree()?);
        };

        let base_commit = self
            .repo
            .revparse_single(base)
            .with_context(|| format!("Failed to resolve reference: {}", base))?
            .peel_to_commit()?;

        let merge_base = self
            .repo
            .merge_base(base_commit.id(), head.id())
            .with_context(|| format!("No merge base between {} and HEAD", base))?;

        Ok(self.repo.find_commit(merge_base)?.tree()?)
    }

    fn diff(&self) -> Result<Diff<'_>> {
        let base_tree = self.base_tree()?;
        let mut opts = DiffOptions::new();

        let diff = if self.include_uncommitted {
            opts.include_untracked(true);
            opts.recurse_untracked_dirs(true);
            self.repo
                .diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))?
        } else {
            let head_tree = self.repo.head()?.peel_to_tree()?;
            self.repo
                .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))?
        };

        Ok(diff)
    }
}

impl ChangeProvider for GitDiff {
    fn changes(&self) -> Result<ChangeSet> {
        let diff = self.diff()?;
        let mut changes = ChangeSet::default();

        for delta in diff.deltas() {
            let Some(path) = delta.new_file().path() else {
                continue;
            };
            let path = path.to_string_lossy().to_string();

            match delta.status() {
                Delta::Added | Delta::Untracked => changes.added.push(path),
                Delta::Modified | Delta::Renamed | Delta::Copied | Delta::Typechange => {
                    changes.modified.push(path)
                }
                _ => {}
            }
        }

        log::debug!(
            "git changeset: {} modified, {} added",
            changes.modified.len(),
            changes.added.len()
        );

        Ok(changes)
    }
}
