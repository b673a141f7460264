//! Cross-references a parsed report with the files touched by a change

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::{
    find_instruction_counters_for_file, parse_project_counter, CounterEntry, CoverageDocument,
    FileCoverage, ProjectCoverage,
};
use crate::error::{Result, ShroudError};

/// Basenames of the files a change modified or added, modified first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchedFileSet {
    names: Vec<String>,
}

impl TouchedFileSet {
    /// Build from changeset paths. Directories are dropped, so files sharing a
    /// basename collapse into one entry; repeats keep their first position.
    pub fn from_changes<M, A>(modified: M, added: A) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let paths = modified
            .into_iter()
            .map(|p| basename(p.as_ref()))
            .chain(added.into_iter().map(|p| basename(p.as_ref())));
        Self::from_names(paths)
    }

    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.is_empty() && seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Aggregated coverage for one run
#[derive(Debug, Clone)]
pub struct CoverageReportResult {
    pub project_coverage: ProjectCoverage,
    /// Touched files present in the report
    pub file_results: BTreeMap<String, FileCoverage>,
    /// Touched files absent from the report, in touched order
    pub unreported_files: Vec<String>,
}

/// Compute project coverage and split touched files into measured and unreported
pub fn aggregate(doc: &CoverageDocument, touched: &TouchedFileSet) -> Result<CoverageReportResult> {
    let project = parse_project_counter(doc)?;
    if project.total() == 0 {
        return Err(ShroudError::malformed(
            "report-level INSTRUCTION counter is empty (missed + covered = 0)",
        ));
    }

    let mut file_results = BTreeMap::new();
    let mut unreported_files = Vec::new();

    for file_name in touched.iter() {
        let counters = find_instruction_counters_for_file(doc, file_name);
        if counters.is_empty() {
            log::debug!("{} not found in coverage report", file_name);
            unreported_files.push(file_name.to_string());
            continue;
        }

        let summed: CounterEntry = counters.into_iter().sum();
        log::debug!(
            "{}: {} covered / {} missed instructions",
            file_name,
            summed.covered,
            summed.missed
        );
        file_results.insert(
            file_name.to_string(),
            FileCoverage {
                file_name: file_name.to_string(),
                counters: summed,
            },
        );
    }

    Ok(CoverageReportResult {
        project_coverage: ProjectCoverage { counters: project },
        file_results,
        unreported_files,
    })
}
