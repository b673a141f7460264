//! One coverage run: locate report, parse, aggregate over the changeset, evaluate

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::coverage::{
    aggregate, evaluate, CoverageDocument, Evaluation, ReportFormat, ThresholdPolicy,
    TouchedFileSet,
};
use crate::error::ShroudError;
use crate::git::ChangeProvider;

/// Everything a run needs besides the changeset
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Display label for the project or sub-project
    pub module_name: String,
    pub file: PathBuf,
    pub format: ReportFormat,
    pub policy: ThresholdPolicy,
}

impl ReportRequest {
    pub fn new(module_name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            module_name: module_name.into(),
            file: file.into(),
            format: ReportFormat::default(),
            policy: ThresholdPolicy::default(),
        }
    }
}

/// Run the whole pipeline. Any error aborts before anything is rendered.
pub fn report(request: &ReportRequest, changes: &dyn ChangeProvider) -> Result<Evaluation> {
    request.policy.validate()?;

    let path = resolve_report_path(&request.file)?;
    log::info!("Reading {} report from {}", request.format, path.display());
    let doc = CoverageDocument::load(&path)?;

    let changeset = changes.changes()?;
    let touched = TouchedFileSet::from_changes(&changeset.modified, &changeset.added);
    log::debug!(
        "Touched files: {}",
        touched.iter().collect::<Vec<_>>().join(", ")
    );

    let result = aggregate(&doc, &touched)?;
    if !result.unreported_files.is_empty() {
        log::debug!(
            "Files not in coverage report: {}",
            result.unreported_files.join(", ")
        );
    }

    Ok(evaluate(
        &result,
        &request.policy,
        &request.module_name,
        request.format,
    ))
}

/// Resolve the report path, expanding a glob pattern to exactly one file
///
/// An existing file is always taken as written, even if its path contains
/// glob metacharacters.
pub fn resolve_report_path(file: &Path) -> crate::error::Result<PathBuf> {
    let pattern = file.to_string_lossy();
    if pattern.trim().is_empty() {
        return Err(ShroudError::configuration("Please specify a coverage report file"));
    }

    if file.is_file() {
        return Ok(file.to_path_buf());
    }
    if !is_glob(&pattern) {
        return Err(ShroudError::ReportNotFound(file.to_path_buf()));
    }

    let paths = glob::glob(&pattern)
        .map_err(|e| ShroudError::configuration(format!("Invalid report pattern {}: {}", pattern, e)))?;
    let mut matches: Vec<PathBuf> = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();

    match matches.len() {
        0 => Err(ShroudError::ReportNotFound(file.to_path_buf())),
        1 => Ok(matches.remove(0)),
        n => Err(ShroudError::configuration(format!(
            "Report pattern {} matches {} files: {}",
            pattern,
            n,
            matches
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_path_is_configuration_error() {
        let err = resolve_report_path(Path::new("")).unwrap_err();
        assert!(matches!(err, ShroudError::Configuration(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = resolve_report_path(&dir.path().join("jacoco.xml")).unwrap_err();
        assert!(matches!(err, ShroudError::ReportNotFound(_)));
    }

    #[test]
    fn test_directory_is_not_a_report() {
        let dir = tempdir().unwrap();
        let err = resolve_report_path(dir.path()).unwrap_err();
        assert!(matches!(err, ShroudError::ReportNotFound(_)));
    }

    #[test]
    fn test_glob_resolution() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app/build")).unwrap();
        fs::write(dir.path().join("app/build/jacoco.xml"), "<report/>").unwrap();

        let pattern = dir.path().join("*/build/jacoco.xml");
        let resolved = resolve_report_path(&pattern).unwrap();
        assert_eq!(resolved, dir.path().join("app/build/jacoco.xml"));

        fs::create_dir_all(dir.path().join("lib/build")).unwrap();
        fs::write(dir.path().join("lib/build/jacoco.xml"), "<report/>").unwrap();
        let err = resolve_report_path(&pattern).unwrap_err();
        assert!(matches!(err, ShroudError::Configuration(_)));

        let err = resolve_report_path(&dir.path().join("*/build/kover.xml")).unwrap_err();
        assert!(matches!(err, ShroudError::ReportNotFound(_)));
    }

    #[test]
    fn test_existing_file_with_brackets_is_used_as_written() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("reports[debug]")).unwrap();
        let file = dir.path().join("reports[debug]/jacoco.xml");
        fs::write(&file, "<report/>").unwrap();

        assert_eq!(resolve_report_path(&file).unwrap(), file);
    }
}
